// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use lexis::{LexicalAnalyzer, TokenDefinition};

#[test]
fn arithmetic_input_lexes_and_consumer_filters_whitespace() {
    let definitions = vec![
        TokenDefinition::from_pattern("int", "[0-9]+", 0).unwrap(),
        TokenDefinition::from_pattern("+", r"\+", 0).unwrap(),
        TokenDefinition::from_pattern("*", r"\*", 0).unwrap(),
        TokenDefinition::from_pattern("ws", r"[ \n]+", 0).unwrap(),
    ];
    let mut lexer = LexicalAnalyzer::new(definitions).unwrap();

    let tokens = lexer.tokenize("12 + 3*4").unwrap();
    let significant: Vec<_> = tokens.iter().filter(|t| t.kind() != "ws").collect();

    let kinds: Vec<&str> = significant.iter().map(|t| t.kind()).collect();
    assert_eq!(kinds, ["int", "+", "int", "*", "int"]);
    let lexemes: Vec<&str> = significant.iter().map(|t| t.lexeme()).collect();
    assert_eq!(lexemes, ["12", "+", "3", "*", "4"]);
}

#[test]
fn token_order_is_input_order() {
    let definitions = vec![
        TokenDefinition::from_pattern("a", "a", 0).unwrap(),
        TokenDefinition::from_pattern("b", "b", 0).unwrap(),
    ];
    let mut lexer = LexicalAnalyzer::new(definitions).unwrap();
    let tokens = lexer.tokenize("abba").unwrap();
    let kinds: Vec<&str> = tokens.iter().map(|t| t.kind()).collect();
    assert_eq!(kinds, ["a", "b", "b", "a"]);
    let positions: Vec<usize> = tokens.iter().map(|t| t.position()).collect();
    assert_eq!(positions, [0, 1, 2, 3]);
}
