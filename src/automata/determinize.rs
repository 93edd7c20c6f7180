use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::automaton::{Automaton, Label, State, StateSet, Transition};

/// Folds every transition labelled with the empty label into direct
/// successors: each state gains the non-epsilon transitions of its closure
/// and becomes terminal when its closure contains a terminal state.
pub fn remove_epsilon_transitions(a: &Automaton) -> Automaton {
    let mut b = Automaton::new();
    let mut map: HashMap<State, State> = HashMap::new();
    let mut closures: Vec<(State, StateSet)> = Vec::with_capacity(a.state_count());
    for s in a.states() {
        let closure = a.epsilon_closure(&StateSet::singleton(*s));
        let terminal = s.is_terminal() || closure.iter().any(|c| c.is_terminal());
        map.insert(*s, b.add_state(s.is_initial(), terminal));
        closures.push((*s, closure));
    }
    for (s, closure) in &closures {
        for t in a.delta_set(closure) {
            if t.label().is_epsilon() {
                continue;
            }
            let _ = b.add_transition(Transition::new(
                map[s],
                t.label().clone(),
                map[&t.end()],
            ));
        }
    }
    b
}

/// Subset construction. The result recognizes the same language and satisfies
/// `is_deterministic`; its states correspond to subsets of the source states.
/// The start subset is materialized even when the source has no initial
/// state, so the result always has exactly one initial state.
pub fn determinize(a: &Automaton) -> Automaton {
    let a = remove_epsilon_transitions(a);
    let mut b = Automaton::new();
    let mut map: HashMap<StateSet, State> = HashMap::new();
    let mut queue: VecDeque<StateSet> = VecDeque::new();
    let mut done: HashSet<StateSet> = HashSet::new();

    let start = a.initials().clone();
    let terminal = start.iter().any(|s| s.is_terminal());
    map.insert(start.clone(), b.add_state(true, terminal));
    queue.push_back(start);

    while let Some(subset) = queue.pop_front() {
        done.insert(subset.clone());
        let from = map[&subset];
        for action in a.alphabet().iter().flatten() {
            let mut destinations = StateSet::new();
            for s in subset.iter() {
                for t in a.delta_action(s, Some(action.as_str())) {
                    destinations.insert(t.end());
                }
            }
            if destinations.is_empty() {
                continue;
            }
            let to = match map.get(&destinations) {
                Some(state) => *state,
                None => {
                    let terminal = destinations.iter().any(|s| s.is_terminal());
                    let state = b.add_state(false, terminal);
                    map.insert(destinations.clone(), state);
                    state
                }
            };
            let _ = b.add_transition(Transition::new(from, Label::plain(action), to));
            if !done.contains(&destinations) {
                queue.push_back(destinations);
            }
        }
    }
    b
}

/// Complement over the automaton's own alphabet.
pub fn complement(a: &Automaton) -> Automaton {
    complement_with(a, &BTreeSet::new())
}

/// Complement over the automaton's alphabet enriched with `extra`. The
/// determinized source is copied with terminal flags inverted; a single
/// shared terminal trash state collects every missing (state, symbol) pair
/// and self-loops on the whole enriched alphabet, so words outside the
/// source alphabet are accepted.
pub fn complement_with(a: &Automaton, extra: &BTreeSet<Option<String>>) -> Automaton {
    let mut alphabet: BTreeSet<Option<String>> = a.alphabet().clone();
    alphabet.extend(extra.iter().cloned());

    let det = determinize(a);
    let mut ret = Automaton::new();

    let trash = ret.add_state(false, true);
    for action in &alphabet {
        let label = match action {
            Some(a) => Label::plain(a),
            None => Label::Epsilon,
        };
        let _ = ret.add_transition(Transition::new(trash, label, trash));
    }

    let mut map: HashMap<State, State> = HashMap::new();
    let mut todo: VecDeque<State> = det.initials().iter().collect();
    while let Some(st) = todo.pop_front() {
        let ns = match map.get(&st) {
            Some(s) => *s,
            None => {
                let s = ret.add_state(st.is_initial(), !st.is_terminal());
                map.insert(st, s);
                s
            }
        };
        for action in &alphabet {
            let label = match action {
                Some(a) => Label::plain(a),
                None => Label::Epsilon,
            };
            let ends = det.delta_action(st, action.as_deref());
            if ends.is_empty() {
                let _ = ret.add_transition(Transition::new(ns, label, trash));
            } else {
                for t in ends {
                    let end = t.end();
                    let ne = match map.get(&end) {
                        Some(s) => *s,
                        None => {
                            let s = ret.add_state(end.is_initial(), !end.is_terminal());
                            map.insert(end, s);
                            todo.push_back(end);
                            s
                        }
                    };
                    let _ = ret.add_transition(Transition::new(ns, label.clone(), ne));
                }
            }
        }
    }
    ret
}
