use std::collections::HashSet;

use super::automaton::{Automaton, Label};
use super::determinize::complement_with;
use super::ops::prune;
use super::product::intersection;

/// True iff no accessible state is terminal.
pub fn is_empty(a: &Automaton) -> bool {
    a.accessible_states().iter().all(|s| !s.is_terminal())
}

/// True iff the automaton has no empty label in its alphabet, at most one
/// initial state and at most one outgoing transition per label per state.
pub fn is_deterministic(a: &Automaton) -> bool {
    if a.alphabet().contains(&None) {
        return false;
    }
    if a.initials().len() > 1 {
        return false;
    }
    for s in a.states() {
        let mut seen: HashSet<&Label> = HashSet::new();
        for t in a.delta(*s) {
            if !seen.insert(t.label()) {
                return false;
            }
        }
    }
    true
}

/// Language inclusion `L(a) ⊆ L(b)`, decided through
/// `intersection(a, complement(b))` with `b`'s complement enriched by `a`'s
/// alphabet.
pub fn inclusion(a: &Automaton, b: &Automaton) -> bool {
    inclusion_counter_example(a, b).is_none()
}

/// The pruned counterexample language `L(a) \ L(b)`, `None` when the
/// inclusion holds.
pub fn inclusion_counter_example(a: &Automaton, b: &Automaton) -> Option<Automaton> {
    let cb = complement_with(b, a.alphabet());
    let cex = prune(&intersection(a, &cb));
    if is_empty(&cex) {
        None
    } else {
        Some(cex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::automaton::Transition;
    use itertools::Itertools;

    fn words<'a>(alphabet: &[&'a str], max_len: usize) -> Vec<Vec<&'a str>> {
        let mut all: Vec<Vec<&str>> = vec![vec![]];
        for len in 1..=max_len {
            all.extend(
                std::iter::repeat(alphabet.iter().copied())
                    .take(len)
                    .multi_cartesian_product(),
            );
        }
        all
    }

    #[test]
    fn emptiness_ignores_unreachable_terminals() {
        let mut a = Automaton::new();
        let s0 = a.add_state(true, false);
        let s1 = a.add_state(false, false);
        let _ = a.add_transition(Transition::new(s0, Label::plain("a"), s1));
        a.add_state(false, true);
        assert!(is_empty(&a));
        assert!(!is_empty(&Automaton::word_automaton(&["a"])));
    }

    #[test]
    fn determinism_test_rejects_each_violation() {
        // empty label in the alphabet
        let mut eps = Automaton::new();
        let s0 = eps.add_state(true, true);
        let s1 = eps.add_state(false, false);
        let _ = eps.add_transition(Transition::new(s0, Label::Epsilon, s1));
        assert!(!is_deterministic(&eps));

        // two initial states
        let mut two = Automaton::new();
        two.add_state(true, false);
        two.add_state(true, true);
        assert!(!is_deterministic(&two));

        // two outgoing transitions on the same label
        let mut fork = Automaton::new();
        let s0 = fork.add_state(true, false);
        let s1 = fork.add_state(false, true);
        let s2 = fork.add_state(false, true);
        let _ = fork.add_transition(Transition::new(s0, Label::plain("a"), s1));
        let _ = fork.add_transition(Transition::new(s0, Label::plain("a"), s2));
        assert!(!is_deterministic(&fork));

        assert!(is_deterministic(&Automaton::word_automaton(&["a", "b"])));
    }

    #[test]
    fn inclusion_agrees_with_word_enumeration() {
        // a ⊆ b: {ab} against {ab, abb...} style supersets
        let a = Automaton::word_automaton(&["a", "b"]);
        let mut b = Automaton::new();
        let s0 = b.add_state(true, false);
        let s1 = b.add_state(false, false);
        let s2 = b.add_state(false, true);
        let _ = b.add_transition(Transition::new(s0, Label::plain("a"), s1));
        let _ = b.add_transition(Transition::new(s1, Label::plain("b"), s2));
        let _ = b.add_transition(Transition::new(s2, Label::plain("b"), s2));

        assert!(inclusion(&a, &b));
        assert!(!inclusion(&b, &a));

        for word in words(&["a", "b"], 4) {
            if a.accept(&word) {
                assert!(b.accept(&word), "inclusion witness {:?}", word);
            }
        }
    }

    #[test]
    fn counter_example_is_retrievable() {
        let a = Automaton::word_automaton(&["a"]);
        let b = Automaton::word_automaton(&["b"]);
        let cex = inclusion_counter_example(&a, &b).unwrap();
        // the difference language contains "a" and nothing of L(b)
        assert!(cex.accept(&["a"]));
        assert!(!cex.accept(&["b"]));
        assert!(inclusion_counter_example(&a, &a).is_none());
    }
}
