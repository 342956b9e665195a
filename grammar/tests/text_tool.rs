// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! The plain-text grammar surface end to end: classification of rule
//! files and analysis of production files.

use grammar::{
    classify_rules, eliminate_left_recursion, text, Grammar, GrammarClass, Symbol,
};

#[test]
fn classification_of_rule_files() {
    let cases = [
        ("S -> aS\nS -> a\n", GrammarClass::RegularRight),
        ("S -> Sa\nS -> a\n", GrammarClass::RegularLeft),
        ("S -> aSa\nS -> a\n", GrammarClass::ContextFree),
        ("AB -> BA\nA -> a\nB -> b\n", GrammarClass::ContextSensitive),
        ("AB -> A\nA -> aB\n", GrammarClass::Unrestricted),
        // both regular directions in one grammar
        ("S -> aS\nA -> Sa\nS -> a\n", GrammarClass::ContextFree),
    ];
    for (source, expected) in cases {
        let rules = text::parse_rules(source).unwrap();
        assert_eq!(classify_rules(&rules), expected, "on {:?}", source);
    }
}

#[test]
fn production_files_feed_the_analyses() {
    // S -> Sa | b in the one-character surface
    let productions = text::parse_productions("S -> Sa\nS -> b\n").unwrap();
    let grammar = Grammar::new(productions, Some(Symbol::non_terminal("S"))).unwrap();
    let first = grammar.first_of(&Symbol::non_terminal("S")).unwrap();
    let terminals: Vec<&str> = first.terminals.iter().map(|s| s.as_str()).collect();
    assert_eq!(terminals, ["b"]);

    let rewritten = eliminate_left_recursion(&grammar).unwrap();
    assert!(rewritten
        .non_terminals()
        .any(|symbol| symbol.name() == "S'"));
    let described = rewritten.describe();
    assert!(described.contains("S -> b S'"));
    assert!(described.contains("S' -> a S'"));
    assert!(described.contains("S' -> \\e"));
}

#[test]
fn epsilon_spellings_agree() {
    let explicit = text::parse_productions("A -> \\e\n").unwrap();
    let implicit = text::parse_productions("A ->\n").unwrap();
    assert_eq!(explicit, implicit);
    assert!(explicit[0].is_empty());
}
