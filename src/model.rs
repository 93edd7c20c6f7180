extern crate serde_json;
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::automata::automaton::{Automaton, Label, State, Transition};
use crate::opacity::Opacity;

/// Action string standing for the empty label in descriptions.
pub const EPSILON_ACTION: &str = "@";

/// One labelled triple of an automaton description; `p` marks the label as
/// probabilistic.
#[derive(Debug, Deserialize, Clone)]
pub struct TransitionDef {
    pub q: u32,
    pub a: String,
    #[serde(default)]
    pub p: Option<f64>,
    pub q_prime: u32,
}

/// An automaton description: state identifiers, the initial and terminal
/// subsets and the transition relation. The alphabet is implied by the
/// transitions.
#[derive(Debug, Deserialize, Clone)]
pub struct AutomatonDef {
    pub states: Vec<u32>,
    pub initial: Vec<u32>,
    pub terminal: Vec<u32>,
    pub delta: Vec<TransitionDef>,
}

/// A full opacity problem description.
#[derive(Debug, Deserialize, Clone)]
pub struct ProblemDef {
    pub system: AutomatonDef,
    pub observations: Vec<AutomatonDef>,
    pub predicate: AutomatonDef,
}

impl AutomatonDef {
    pub fn build(&self) -> Result<Automaton, Box<dyn Error>> {
        let mut auto = Automaton::new();
        let mut map: HashMap<u32, State> = HashMap::new();
        for q in &self.states {
            map.insert(
                *q,
                auto.add_state(self.initial.contains(q), self.terminal.contains(q)),
            );
        }
        for t in &self.delta {
            let start = *map
                .get(&t.q)
                .ok_or_else(|| format!("transition from unknown state {}", t.q))?;
            let end = *map
                .get(&t.q_prime)
                .ok_or_else(|| format!("transition to unknown state {}", t.q_prime))?;
            let label = if t.a == EPSILON_ACTION {
                Label::Epsilon
            } else {
                match t.p {
                    Some(p) => Label::prob(&t.a, p),
                    None => Label::plain(&t.a),
                }
            };
            auto.add_transition(Transition::new(start, label, end))?;
        }
        Ok(auto)
    }
}

impl ProblemDef {
    pub fn build(&self) -> Result<Opacity, Box<dyn Error>> {
        let system = self.system.build()?;
        let mut observations = Vec::with_capacity(self.observations.len());
        for o in &self.observations {
            observations.push(o.build()?);
        }
        let predicate = self.predicate.build()?;
        Ok(Opacity::new(system, observations, predicate))
    }
}

pub fn read_problem_json<P: AsRef<Path>>(path: P) -> Result<ProblemDef, Box<dyn Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let u = serde_json::from_reader(reader)?;
    Ok(u)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_probabilistic_problem_from_json() {
        let raw = r#"{
            "system": {
                "states": [0, 1, 2],
                "initial": [0],
                "terminal": [1, 2],
                "delta": [
                    {"q": 0, "a": "a", "p": 0.3, "q_prime": 1},
                    {"q": 0, "a": "b", "p": 0.7, "q_prime": 2}
                ]
            },
            "observations": [
                {"states": [0, 1], "initial": [0], "terminal": [1],
                 "delta": [{"q": 0, "a": "a", "q_prime": 1}]},
                {"states": [0, 1], "initial": [0], "terminal": [1],
                 "delta": [{"q": 0, "a": "b", "q_prime": 1}]}
            ],
            "predicate": {
                "states": [0, 1], "initial": [0], "terminal": [1],
                "delta": [{"q": 0, "a": "a", "q_prime": 1}]
            }
        }"#;
        let def: ProblemDef = serde_json::from_str(raw).unwrap();
        let opacity = def.build().unwrap();
        assert!(opacity.validate_data().is_ok());
        assert!(opacity.automaton().accept(&["a"]));
        assert!(opacity.automaton().accept(&["b"]));
        assert_eq!(opacity.observations().len(), 2);
    }

    #[test]
    fn epsilon_action_maps_to_the_empty_label() {
        let raw = r#"{
            "states": [0, 1, 2],
            "initial": [0],
            "terminal": [2],
            "delta": [
                {"q": 0, "a": "@", "q_prime": 1},
                {"q": 1, "a": "x", "q_prime": 2}
            ]
        }"#;
        let def: AutomatonDef = serde_json::from_str(raw).unwrap();
        let auto = def.build().unwrap();
        assert!(auto.accept(&["x"]));
        assert!(auto.alphabet().contains(&None));
    }

    #[test]
    fn unknown_endpoint_is_an_error() {
        let raw = r#"{
            "states": [0],
            "initial": [0],
            "terminal": [0],
            "delta": [{"q": 0, "a": "a", "q_prime": 7}]
        }"#;
        let def: AutomatonDef = serde_json::from_str(raw).unwrap();
        assert!(def.build().is_err());
    }
}
