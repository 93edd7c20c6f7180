use std::collections::{HashMap, VecDeque};

use super::automaton::{Automaton, Label, State, StateSet, Transition};
use super::determinize::determinize;

enum SyncMode {
    // synchronize on full label equality
    Exact,
    // synchronize on equal action components, keep the left-hand label
    ByAction,
}

/// Product of two automata synchronizing on exact label equality. The second
/// operand is determinized first; the first may stay non-deterministic, its
/// epsilon closure is computed on demand while exploring.
pub fn intersection(a: &Automaton, b: &Automaton) -> Automaton {
    build_product(a, b, SyncMode::Exact)
}

/// Probability-preserving synchronized product: transitions synchronize when
/// their action components match and the emitted label is the left-hand,
/// probabilistic one. Inapplicable (None) when the first operand's first
/// transition label is not probabilistic.
pub fn sync_product(a: &Automaton, b: &Automaton) -> Option<Automaton> {
    let first = a.delta_all().into_iter().next()?;
    if !first.label().is_probabilistic() {
        return None;
    }
    Some(build_product(a, b, SyncMode::ByAction))
}

fn build_product(a: &Automaton, b_in: &Automaton, mode: SyncMode) -> Automaton {
    let b = determinize(b_in);
    let mut sync = Automaton::new();
    let mut pair_map: HashMap<(State, State), State> = HashMap::new();
    let mut queue: VecDeque<(State, State)> = VecDeque::new();

    let a_start = a.epsilon_closure(a.initials());
    let b_start = match b.initials().iter().next() {
        Some(s) => s,
        None => return sync,
    };

    for a_state in a_start.iter() {
        let state = sync.add_state(
            a_state.is_initial() && b_start.is_initial(),
            a_state.is_terminal() && b_start.is_terminal(),
        );
        pair_map.insert((a_state, b_start), state);
        queue.push_back((a_state, b_start));
    }

    while let Some(pair) = queue.pop_front() {
        let from = pair_map[&pair];
        let (a_state, b_state) = pair;

        // b is deterministic, so each label resolves to at most one transition
        let mut b_by_label: HashMap<&Label, &Transition> = HashMap::new();
        let mut b_by_action: HashMap<&str, &Transition> = HashMap::new();
        for t in b.delta(b_state) {
            match mode {
                SyncMode::Exact => {
                    b_by_label.insert(t.label(), t);
                }
                SyncMode::ByAction => {
                    if let Some(action) = t.label().action() {
                        b_by_action.insert(action, t);
                    }
                }
            }
        }

        let closed = a.epsilon_closure(&StateSet::singleton(a_state));
        for t in a.delta_set(&closed) {
            let matched = match mode {
                SyncMode::Exact => b_by_label.get(t.label()).copied(),
                SyncMode::ByAction => t
                    .label()
                    .action()
                    .and_then(|action| b_by_action.get(action).copied()),
            };
            let bt = match matched {
                Some(bt) => bt,
                None => continue,
            };
            let next = (t.end(), bt.end());
            let to = match pair_map.get(&next) {
                Some(s) => *s,
                None => {
                    let s = sync.add_state(
                        next.0.is_initial() && next.1.is_initial(),
                        next.0.is_terminal() && next.1.is_terminal(),
                    );
                    pair_map.insert(next, s);
                    queue.push_back(next);
                    s
                }
            };
            let _ = sync.add_transition(Transition::new(from, t.label().clone(), to));
        }
    }
    sync
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::properties::is_empty;

    fn two_branch_system() -> Automaton {
        let mut a = Automaton::new();
        let s0 = a.add_state(true, false);
        let s1 = a.add_state(false, true);
        let s2 = a.add_state(false, true);
        let _ = a.add_transition(Transition::new(s0, Label::prob("a", 0.3), s1));
        let _ = a.add_transition(Transition::new(s0, Label::prob("b", 0.7), s2));
        a
    }

    #[test]
    fn intersection_keeps_common_words() {
        let ab = Automaton::word_automaton(&["a", "b"]);
        let mut other = Automaton::new();
        let s0 = other.add_state(true, false);
        let s1 = other.add_state(false, true);
        let s2 = other.add_state(false, true);
        let _ = other.add_transition(Transition::new(s0, Label::plain("a"), s1));
        let _ = other.add_transition(Transition::new(s1, Label::plain("b"), s2));
        let _ = other.add_transition(Transition::new(s0, Label::plain("c"), s2));

        let product = intersection(&ab, &other);
        assert!(product.accept(&["a", "b"]));
        assert!(!product.accept(&["a"]));
        assert!(!product.accept(&["c"]));
    }

    #[test]
    fn intersection_of_disjoint_languages_is_empty() {
        let a = Automaton::word_automaton(&["a"]);
        let b = Automaton::word_automaton(&["b"]);
        assert!(is_empty(&intersection(&a, &b)));
    }

    #[test]
    fn sync_product_preserves_probabilities() {
        let system = two_branch_system();
        let obs = Automaton::word_automaton(&["a"]);
        let product = sync_product(&system, &obs).unwrap();
        assert!(product.accept(&["a"]));
        assert!(!product.accept(&["b"]));
        let labels: Vec<_> = product.delta_all();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].label().is_probabilistic());
        assert!((labels[0].label().probability() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn sync_product_requires_probabilistic_operand() {
        let plain = Automaton::word_automaton(&["a"]);
        let obs = Automaton::word_automaton(&["a"]);
        assert!(sync_product(&plain, &obs).is_none());
    }
}
