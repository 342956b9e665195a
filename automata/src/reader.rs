// Copyright 2022 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! Plain-text transition-list input for diagnostic tooling.
//!
//! One edge per line, `FROM -> TO[:sym[,sym…]]`; a missing symbol list
//! means a single ε edge.  `start:ID` and `end:ID` lines assign roles.
//! Node names become state labels; symbols must be single characters.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use crate::error::FaError;
use crate::fa::Automaton;
use crate::node::{State, StateId};

lazy_static! {
    static ref ROLE_CRE: regex::Regex = regex::Regex::new(r"^(start|end)\s*:\s*(\S+)$").unwrap();
    static ref EDGE_CRE: regex::Regex =
        regex::Regex::new(r"^(\S+)\s*->\s*([^:\s]+)\s*(?::\s*(.+))?$").unwrap();
}

#[derive(Default)]
struct Reader {
    ids: BTreeMap<String, StateId>,
    states: BTreeMap<StateId, State<char>>,
}

impl Reader {
    fn state_named(&mut self, name: &str) -> StateId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let mut state = State::new();
        state.add_label(name);
        let id = state.id();
        self.ids.insert(name.to_string(), id);
        self.states.insert(id, state);
        id
    }

    fn state_mut(&mut self, id: StateId) -> &mut State<char> {
        self.states.get_mut(&id).expect("id came from state_named")
    }
}

pub fn read_transitions(text: &str) -> Result<Automaton<char>, FaError> {
    let mut reader = Reader::default();
    let mut saw_start = false;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_number = index + 1;
        if let Some(captures) = ROLE_CRE.captures(line) {
            let id = reader.state_named(&captures[2]);
            match &captures[1] {
                "start" => {
                    reader.state_mut(id).set_start(true);
                    saw_start = true;
                }
                _ => reader.state_mut(id).set_end(true),
            }
        } else if let Some(captures) = EDGE_CRE.captures(line) {
            let from = reader.state_named(&captures[1]);
            let to = reader.state_named(&captures[2]);
            let symbols = match captures.get(3) {
                None => vec![None],
                Some(list) => parse_symbols(list.as_str(), line_number)?,
            };
            for symbol in symbols {
                reader.state_mut(from).add_transition(symbol, to);
            }
        } else {
            return Err(FaError::invalid_input(format!(
                "line {}: unrecognised transition syntax \"{}\"",
                line_number, line
            )));
        }
    }

    if !saw_start {
        return Err(FaError::invalid_input(
            "transition list declares no start state",
        ));
    }
    Automaton::from_states(reader.states)
}

fn parse_symbols(list: &str, line_number: usize) -> Result<Vec<Option<char>>, FaError> {
    let mut symbols = vec![];
    for item in list.split(',') {
        let item = item.trim();
        let mut chars = item.chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => symbols.push(Some(symbol)),
            _ => {
                return Err(FaError::invalid_input(format!(
                    "line {}: symbol \"{}\" is not a single character",
                    line_number, item
                )))
            }
        }
    }
    Ok(symbols)
}
