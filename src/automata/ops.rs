use std::collections::HashMap;

use super::automaton::{Automaton, Label, State, Transition};

/// State-disjoint union: a deep copy of `a` into which all of `b`'s states
/// and transitions are copied under a fresh identity mapping.
pub fn union(a: &Automaton, b: &Automaton) -> Automaton {
    let mut ap = a.duplicate();
    let mut map: HashMap<State, State> = HashMap::new();
    for s in b.states() {
        map.insert(*s, ap.add_state(s.is_initial(), s.is_terminal()));
    }
    for t in b.delta_all() {
        let _ = ap.add_transition(Transition::new(
            map[&t.start()],
            t.label().clone(),
            map[&t.end()],
        ));
    }
    ap
}

/// Keeps only the states that are both accessible and co-accessible, and the
/// transitions whose endpoints both survive.
pub fn prune(a: &Automaton) -> Automaton {
    let keep = a.accessible_and_co_accessible();
    let mut b = Automaton::new();
    let mut map: HashMap<State, State> = HashMap::new();
    for s in keep.iter() {
        map.insert(s, b.add_state(s.is_initial(), s.is_terminal()));
    }
    for t in a.delta_all() {
        let (start, end) = match (map.get(&t.start()), map.get(&t.end())) {
            (Some(s), Some(e)) => (*s, *e),
            _ => continue,
        };
        let _ = b.add_transition(Transition::new(start, t.label().clone(), end));
    }
    b
}

/// Swaps the initial and terminal roles and reverses every transition.
pub fn reverse(a: &Automaton) -> Automaton {
    let mut b = Automaton::new();
    let mut map: HashMap<State, State> = HashMap::new();
    for s in a.states() {
        map.insert(*s, b.add_state(s.is_terminal(), s.is_initial()));
    }
    for t in a.delta_all() {
        let _ = b.add_transition(Transition::new(
            map[&t.end()],
            t.label().clone(),
            map[&t.start()],
        ));
    }
    b
}

/// Completes the automaton over its own alphabet: every state missing an
/// outgoing transition for some alphabet symbol is wired to a shared
/// non-terminal hole state, created on demand, which self-loops on the whole
/// alphabet. The recognized language is unchanged.
pub fn sink_complete(a: &Automaton) -> Automaton {
    let mut b = a.duplicate();
    let mut hole: Option<State> = None;
    let alphabet: Vec<Option<String>> = b.alphabet().iter().cloned().collect();
    let states: Vec<State> = b.states().to_vec();
    for s in states {
        for action in &alphabet {
            if !b.delta_action(s, action.as_deref()).is_empty() {
                continue;
            }
            let sink = match hole {
                Some(h) => h,
                None => {
                    let h = b.add_state(false, false);
                    hole = Some(h);
                    h
                }
            };
            let _ = b.add_transition(Transition::new(s, plain_or_epsilon(action), sink));
        }
    }
    if let Some(sink) = hole {
        for action in &alphabet {
            let _ = b.add_transition(Transition::new(sink, plain_or_epsilon(action), sink));
        }
    }
    b
}

fn plain_or_epsilon(action: &Option<String>) -> Label {
    match action {
        Some(a) => Label::plain(a),
        None => Label::Epsilon,
    }
}

/// The non-probabilistic view of an automaton: probabilistic labels are
/// stripped down to their action. When the first transition label is already
/// non-probabilistic the automaton is returned as a plain copy. States are
/// created lazily from the transition walk, so states without transitions are
/// dropped.
pub fn unprob(a: &Automaton) -> Automaton {
    let transitions = a.delta_all();
    match transitions.first() {
        Some(t) if t.label().is_probabilistic() => {}
        _ => return a.duplicate(),
    }

    let mut auto = Automaton::new();
    let mut map: HashMap<State, State> = HashMap::new();
    for t in transitions {
        let label = match t.label().action() {
            Some(action) => Label::plain(action),
            None => Label::Epsilon,
        };
        let start = match map.get(&t.start()) {
            Some(s) => *s,
            None => {
                let s = auto.add_state(t.start().is_initial(), t.start().is_terminal());
                map.insert(t.start(), s);
                s
            }
        };
        let end = match map.get(&t.end()) {
            Some(s) => *s,
            None => {
                let s = auto.add_state(t.end().is_initial(), t.end().is_terminal());
                map.insert(t.end(), s);
                s
            }
        };
        let _ = auto.add_transition(Transition::new(start, label, end));
    }
    auto
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_recognizes_both_languages() {
        let a = Automaton::word_automaton(&["a"]);
        let b = Automaton::word_automaton(&["b", "b"]);
        let u = union(&a, &b);
        assert!(u.accept(&["a"]));
        assert!(u.accept(&["b", "b"]));
        assert!(!u.accept(&["b"]));
        assert_eq!(u.state_count(), a.state_count() + b.state_count());

        let with_empty_word = union(&Automaton::epsilon_automaton(), &a);
        assert!(with_empty_word.accept(&[]));
        assert!(with_empty_word.accept(&["a"]));
    }

    #[test]
    fn prune_drops_useless_states() {
        let mut a = Automaton::new();
        let s0 = a.add_state(true, false);
        let s1 = a.add_state(false, true);
        let dead = a.add_state(false, false);
        let unreachable = a.add_state(false, true);
        let _ = a.add_transition(Transition::new(s0, Label::plain("a"), s1));
        let _ = a.add_transition(Transition::new(s0, Label::plain("b"), dead));
        let _ = a.add_transition(Transition::new(unreachable, Label::plain("c"), s1));

        let p = prune(&a);
        assert_eq!(p.state_count(), 2);
        assert_eq!(p.transition_count(), 1);
        assert!(p.accept(&["a"]));
        assert!(!p.accept(&["b"]));
    }

    #[test]
    fn reverse_recognizes_mirrored_words() {
        let a = Automaton::word_automaton(&["a", "b", "c"]);
        let r = reverse(&a);
        assert!(r.accept(&["c", "b", "a"]));
        assert!(!r.accept(&["a", "b", "c"]));
    }

    #[test]
    fn sink_complete_preserves_the_language() {
        let a = Automaton::word_automaton(&["a", "b"]);
        let c = sink_complete(&a);
        // one hole state, every (state, symbol) pair now has a successor
        assert_eq!(c.state_count(), a.state_count() + 1);
        for s in c.states() {
            assert_eq!(c.delta(*s).len(), 2);
        }
        assert!(c.accept(&["a", "b"]));
        assert!(!c.accept(&["b", "a"]));
        assert!(!c.accept(&["a", "b", "a"]));
    }

    #[test]
    fn unprob_strips_probabilities() {
        let mut a = Automaton::new();
        let s0 = a.add_state(true, false);
        let s1 = a.add_state(false, true);
        let _ = a.add_transition(Transition::new(s0, Label::prob("a", 0.3), s1));
        let _ = a.add_transition(Transition::new(s0, Label::prob("b", 0.7), s1));

        let u = unprob(&a);
        assert!(u.accept(&["a"]));
        assert!(u.accept(&["b"]));
        assert!(u.delta_all().iter().all(|t| !t.label().is_probabilistic()));
    }

    #[test]
    fn unprob_copies_plain_automata() {
        let a = Automaton::word_automaton(&["a"]);
        let u = unprob(&a);
        assert_eq!(u.state_count(), a.state_count());
        assert!(u.accept(&["a"]));
    }
}
