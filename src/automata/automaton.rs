use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ordered_float::OrderedFloat;
use petgraph::Graph;

static NEXT_AUTOMATON_ID: AtomicU64 = AtomicU64::new(0);

/// A state identity. States are created through [`Automaton::add_state`] and
/// belong to exactly one automaton; the owner tag makes a state from another
/// automaton detectable when inserting transitions. The initial/terminal
/// flags are fixed at creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    owner: u64,
    index: u32,
    initial: bool,
    terminal: bool,
}

impl State {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

/// A transition label. The empty label is printed `@`. A probabilistic label
/// carries the probability of taking the transition; the probability is kept
/// in an `OrderedFloat` so labels can live in hash maps.
///
/// Equality is deliberately two-faced: `Label` equality (used for transition
/// identity and determinism checks) compares the whole label including the
/// probability, while the alphabet and all index queries go through
/// [`Label::action`] and only see the action component.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    Epsilon,
    Plain(String),
    Prob(String, OrderedFloat<f64>),
}

impl Label {
    pub fn plain(action: &str) -> Label {
        Label::Plain(action.to_string())
    }

    pub fn prob(action: &str, probability: f64) -> Label {
        Label::Prob(action.to_string(), OrderedFloat(probability))
    }

    /// The action component, `None` for the empty label.
    pub fn action(&self) -> Option<&str> {
        match self {
            Label::Epsilon => None,
            Label::Plain(a) => Some(a),
            Label::Prob(a, _) => Some(a),
        }
    }

    /// The probability of the transition, 1.0 for non-probabilistic labels.
    pub fn probability(&self) -> f64 {
        match self {
            Label::Prob(_, p) => p.into_inner(),
            _ => 1.0,
        }
    }

    pub fn is_probabilistic(&self) -> bool {
        matches!(self, Label::Prob(_, _))
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Label::Epsilon)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Label::Epsilon => write!(f, "@"),
            Label::Plain(a) => write!(f, "{}", a),
            Label::Prob(a, p) => write!(f, "{} \"{}\"", a, p),
        }
    }
}

/// A transition `(q, l, q')`. Both endpoints must be owned by the automaton
/// the transition is added to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transition {
    start: State,
    label: Label,
    end: State,
}

impl Transition {
    pub fn new(start: State, label: Label, end: State) -> Transition {
        Transition { start, label, end }
    }

    pub fn start(&self) -> State {
        self.start
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn end(&self) -> State {
        self.end
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} --{}--> {}", self.start, self.label, self.end)
    }
}

/// A set of states of one automaton, kept as a sorted index vector so it can
/// be hashed and used as a key during subset construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StateSet {
    members: Vec<State>,
}

impl StateSet {
    pub fn new() -> StateSet {
        StateSet { members: Vec::new() }
    }

    pub fn singleton(state: State) -> StateSet {
        StateSet { members: vec![state] }
    }

    /// Inserts a state, returning true when the set grew.
    pub fn insert(&mut self, state: State) -> bool {
        match self.members.binary_search(&state) {
            Ok(_) => false,
            Err(pos) => {
                self.members.insert(pos, state);
                true
            }
        }
    }

    pub fn contains(&self, state: &State) -> bool {
        self.members.binary_search(state).is_ok()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = State> + '_ {
        self.members.iter().copied()
    }

    pub fn intersect(&self, other: &StateSet) -> StateSet {
        StateSet {
            members: self
                .members
                .iter()
                .filter(|s| other.contains(s))
                .copied()
                .collect(),
        }
    }
}

impl std::iter::FromIterator<State> for StateSet {
    fn from_iter<I: IntoIterator<Item = State>>(iter: I) -> StateSet {
        let mut set = StateSet::new();
        for s in iter {
            set.insert(s);
        }
        set
    }
}

/// Error returned when a transition endpoint does not belong to the automaton
/// it is inserted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoSuchStateError;

impl fmt::Display for NoSuchStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "transition endpoint does not belong to this automaton")
    }
}

impl Error for NoSuchStateError {}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TransitionKey {
    state: State,
    action: Option<String>,
}

/// A finite automaton `A = (X, Q, I, T, D)`: an alphabet, a state arena, the
/// initial and terminal subsets and the transition relation, indexed forward
/// by (start state, action) and backward by (end state, action).
///
/// The alphabet holds the action components actually appearing on
/// transitions; `None` stands for the empty label.
#[derive(Debug)]
pub struct Automaton {
    id: u64,
    states: Vec<State>,
    alphabet: BTreeSet<Option<String>>,
    initials: StateSet,
    terminals: StateSet,
    transitions: HashMap<TransitionKey, HashSet<Transition>>,
    reverse: HashMap<TransitionKey, HashSet<Transition>>,
}

impl Automaton {
    pub fn new() -> Automaton {
        Automaton {
            id: NEXT_AUTOMATON_ID.fetch_add(1, Ordering::Relaxed),
            states: Vec::new(),
            alphabet: BTreeSet::new(),
            initials: StateSet::new(),
            terminals: StateSet::new(),
            transitions: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// An automaton recognizing only the empty word.
    pub fn epsilon_automaton() -> Automaton {
        let mut a = Automaton::new();
        a.add_state(true, true);
        a
    }

    /// An automaton recognizing exactly the given word.
    pub fn word_automaton(word: &[&str]) -> Automaton {
        let mut a = Automaton::new();
        if word.is_empty() {
            a.add_state(true, true);
            return a;
        }
        let mut start = a.add_state(true, false);
        for (i, letter) in word.iter().enumerate() {
            let end = a.add_state(false, i + 1 == word.len());
            let _ = a.add_transition(Transition::new(start, Label::plain(letter), end));
            start = end;
        }
        a
    }

    pub fn add_state(&mut self, initial: bool, terminal: bool) -> State {
        let state = State {
            owner: self.id,
            index: self.states.len() as u32,
            initial,
            terminal,
        };
        self.states.push(state);
        if initial {
            self.initials.insert(state);
        }
        if terminal {
            self.terminals.insert(state);
        }
        state
    }

    fn owns(&self, state: State) -> bool {
        state.owner == self.id && state.index() < self.states.len()
    }

    /// Adds a transition. Fails when either endpoint was not created by this
    /// automaton.
    pub fn add_transition(&mut self, t: Transition) -> Result<(), NoSuchStateError> {
        if !self.owns(t.start()) || !self.owns(t.end()) {
            return Err(NoSuchStateError);
        }
        let action = t.label().action().map(|a| a.to_string());
        self.alphabet.insert(action.clone());
        self.transitions
            .entry(TransitionKey { state: t.start(), action: action.clone() })
            .or_insert_with(HashSet::new)
            .insert(t.clone());
        self.reverse
            .entry(TransitionKey { state: t.end(), action })
            .or_insert_with(HashSet::new)
            .insert(t);
        Ok(())
    }

    pub fn alphabet(&self) -> &BTreeSet<Option<String>> {
        &self.alphabet
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn initials(&self) -> &StateSet {
        &self.initials
    }

    pub fn terminals(&self) -> &StateSet {
        &self.terminals
    }

    /// All outgoing transitions of a state.
    pub fn delta(&self, state: State) -> Vec<&Transition> {
        let mut out = Vec::new();
        for action in &self.alphabet {
            if let Some(set) = self.transitions.get(&TransitionKey {
                state,
                action: action.clone(),
            }) {
                out.extend(set.iter());
            }
        }
        out
    }

    /// Outgoing transitions of a state whose label carries the given action
    /// component (`None` queries the empty label).
    pub fn delta_action(&self, state: State, action: Option<&str>) -> Vec<&Transition> {
        match self.transitions.get(&TransitionKey {
            state,
            action: action.map(|a| a.to_string()),
        }) {
            Some(set) => set.iter().collect(),
            None => Vec::new(),
        }
    }

    /// All transitions between two given states.
    pub fn delta_from(&self, from: State, to: State) -> Vec<&Transition> {
        self.delta(from)
            .into_iter()
            .filter(|t| t.end() == to)
            .collect()
    }

    /// All outgoing transitions of a set of states.
    pub fn delta_set(&self, states: &StateSet) -> Vec<&Transition> {
        let mut out = Vec::new();
        for s in states.iter() {
            out.extend(self.delta(s));
        }
        out
    }

    /// Every transition of this automaton.
    pub fn delta_all(&self) -> Vec<&Transition> {
        self.transitions.values().flat_map(|set| set.iter()).collect()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.values().map(|set| set.len()).sum()
    }

    /// All transitions ending at a state (the backward query).
    pub fn delta_reverse(&self, state: State) -> Vec<&Transition> {
        let mut out = Vec::new();
        for action in &self.alphabet {
            if let Some(set) = self.reverse.get(&TransitionKey {
                state,
                action: action.clone(),
            }) {
                out.extend(set.iter());
            }
        }
        out
    }

    pub fn delta_reverse_action(&self, state: State, action: Option<&str>) -> Vec<&Transition> {
        match self.reverse.get(&TransitionKey {
            state,
            action: action.map(|a| a.to_string()),
        }) {
            Some(set) => set.iter().collect(),
            None => Vec::new(),
        }
    }

    // Frontier expansion until no growth, forward over the transition index
    // or backward over the reverse index.
    fn access(&self, start: &StateSet, backward: bool) -> StateSet {
        let mut current = start.clone();
        loop {
            let before = current.len();
            let mut grown = current.clone();
            for s in current.iter() {
                if backward {
                    for t in self.delta_reverse(s) {
                        grown.insert(t.start());
                    }
                } else {
                    for t in self.delta(s) {
                        grown.insert(t.end());
                    }
                }
            }
            if grown.len() == before {
                return grown;
            }
            current = grown;
        }
    }

    /// States reachable from the initial set.
    pub fn accessible_states(&self) -> StateSet {
        self.access(&self.initials, false)
    }

    /// States reachable from the given set.
    pub fn accessible_from(&self, states: &StateSet) -> StateSet {
        self.access(states, false)
    }

    /// States from which a terminal state is reachable.
    pub fn co_accessible_states(&self) -> StateSet {
        self.access(&self.terminals, true)
    }

    pub fn accessible_and_co_accessible(&self) -> StateSet {
        self.accessible_states().intersect(&self.co_accessible_states())
    }

    /// The set closure of `states` under transitions labelled with the empty
    /// label.
    pub fn epsilon_closure(&self, states: &StateSet) -> StateSet {
        let mut closed = states.clone();
        let mut stack: Vec<State> = states.iter().collect();
        while let Some(s) = stack.pop() {
            for t in self.delta_action(s, None) {
                if closed.insert(t.end()) {
                    stack.push(t.end());
                }
            }
        }
        closed
    }

    /// One acceptance step: close the current set under the empty label, then
    /// follow the transitions carrying `letter`.
    pub fn step(&self, states: &StateSet, letter: &str) -> StateSet {
        let closed = self.epsilon_closure(states);
        let mut out = StateSet::new();
        for s in closed.iter() {
            for t in self.delta_action(s, Some(letter)) {
                out.insert(t.end());
            }
        }
        out
    }

    /// The set of states reached after reading `word` from `states`,
    /// rejecting early when no state survives.
    pub fn steps(&self, states: &StateSet, word: &[&str]) -> StateSet {
        let mut current = states.clone();
        for letter in word {
            current = self.step(&current, letter);
            if current.is_empty() {
                return current;
            }
        }
        current
    }

    pub fn accept(&self, word: &[&str]) -> bool {
        let reached = self.steps(&self.epsilon_closure(&self.initials), word);
        self.epsilon_closure(&reached).iter().any(|s| s.is_terminal())
    }

    /// The states reached after reading `word` with letters outside the
    /// alphabet skipped instead of rejected, so words from any alphabet are
    /// recognized modulo projection.
    pub fn steps_project(&self, word: &[&str]) -> StateSet {
        let mut current = self.initials.clone();
        for letter in word {
            if !self.alphabet.contains(&Some(letter.to_string())) {
                continue;
            }
            current = self.step(&current, letter);
            if current.is_empty() {
                return current;
            }
        }
        current
    }

    /// True when some state survives reading `word` projected on this
    /// automaton's alphabet. The surviving states need not be terminal.
    pub fn prefix_projection(&self, word: &[&str]) -> bool {
        !self.steps_project(word).is_empty()
    }

    /// A deep copy with a fresh arena. States of the copy are new identities;
    /// the two automata share nothing.
    pub fn duplicate(&self) -> Automaton {
        let mut b = Automaton::new();
        let mut map: HashMap<State, State> = HashMap::new();
        for s in &self.states {
            map.insert(*s, b.add_state(s.is_initial(), s.is_terminal()));
        }
        for t in self.delta_all() {
            let _ = b.add_transition(Transition::new(
                map[&t.start()],
                t.label().clone(),
                map[&t.end()],
            ));
        }
        b
    }

    /// Graph view for dot export.
    pub fn generate_graph(&self) -> Graph<String, String> {
        let mut graph: Graph<String, String> = Graph::new();
        let mut nodes = Vec::with_capacity(self.states.len());
        for state in &self.states {
            let mut tag = format!("{}", state.index);
            if state.initial {
                tag.push_str(" i");
            }
            if state.terminal {
                tag.push_str(" t");
            }
            nodes.push(graph.add_node(tag));
        }
        for t in self.delta_all() {
            graph.add_edge(
                nodes[t.start().index()],
                nodes[t.end().index()],
                format!("{}", t.label()),
            );
        }
        graph
    }
}

impl Default for Automaton {
    fn default() -> Automaton {
        Automaton::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_from_foreign_state_is_rejected() {
        let mut a = Automaton::new();
        let mut b = Automaton::new();
        let s = a.add_state(true, false);
        let t = a.add_state(false, true);
        let foreign = b.add_state(true, true);
        assert!(a.add_transition(Transition::new(s, Label::plain("x"), t)).is_ok());
        assert_eq!(
            a.add_transition(Transition::new(s, Label::plain("x"), foreign)),
            Err(NoSuchStateError)
        );
    }

    #[test]
    fn alphabet_tracks_actions_not_probabilities() {
        let mut a = Automaton::new();
        let s = a.add_state(true, false);
        let t = a.add_state(false, true);
        let _ = a.add_transition(Transition::new(s, Label::prob("a", 0.3), t));
        let _ = a.add_transition(Transition::new(s, Label::prob("a", 0.7), s));
        assert_eq!(a.alphabet().len(), 1);
        assert!(a.alphabet().contains(&Some("a".to_string())));
        // both transitions remain distinguishable under the same action
        assert_eq!(a.delta_action(s, Some("a")).len(), 2);
    }

    #[test]
    fn accept_follows_epsilon_closure() {
        let mut a = Automaton::new();
        let s0 = a.add_state(true, false);
        let s1 = a.add_state(false, false);
        let s2 = a.add_state(false, true);
        let _ = a.add_transition(Transition::new(s0, Label::Epsilon, s1));
        let _ = a.add_transition(Transition::new(s1, Label::plain("a"), s2));
        assert!(a.accept(&["a"]));
        assert!(!a.accept(&[]));
        assert!(!a.accept(&["b"]));
        assert!(!a.accept(&["a", "a"]));
    }

    #[test]
    fn accessibility_queries() {
        let mut a = Automaton::new();
        let s0 = a.add_state(true, false);
        let s1 = a.add_state(false, true);
        let dead = a.add_state(false, false);
        let unreachable = a.add_state(false, true);
        let _ = a.add_transition(Transition::new(s0, Label::plain("a"), s1));
        let _ = a.add_transition(Transition::new(s0, Label::plain("b"), dead));
        let _ = a.add_transition(Transition::new(unreachable, Label::plain("a"), s1));

        let acc = a.accessible_states();
        assert!(acc.contains(&s0) && acc.contains(&s1) && acc.contains(&dead));
        assert!(!acc.contains(&unreachable));

        let coacc = a.co_accessible_states();
        assert!(coacc.contains(&s0) && coacc.contains(&s1) && coacc.contains(&unreachable));
        assert!(!coacc.contains(&dead));

        let trim = a.accessible_and_co_accessible();
        assert_eq!(trim.len(), 2);

        // backward query and reachability from an explicit frontier
        assert_eq!(a.delta_reverse_action(s1, Some("a")).len(), 2);
        let from_dead = a.accessible_from(&StateSet::singleton(dead));
        assert_eq!(from_dead.len(), 1);
    }

    #[test]
    fn projection_skips_foreign_letters() {
        let a = Automaton::word_automaton(&["a", "b"]);
        assert!(a.prefix_projection(&["x", "a", "y", "b"]));
        assert!(a.prefix_projection(&["z"]));
        assert!(!a.prefix_projection(&["b", "a"]));
        assert!(a.steps_project(&["a"]).len() == 1);
    }

    #[test]
    fn delta_from_filters_by_endpoint() {
        let mut a = Automaton::new();
        let s0 = a.add_state(true, false);
        let s1 = a.add_state(false, true);
        let s2 = a.add_state(false, true);
        let _ = a.add_transition(Transition::new(s0, Label::plain("a"), s1));
        let _ = a.add_transition(Transition::new(s0, Label::plain("b"), s1));
        let _ = a.add_transition(Transition::new(s0, Label::plain("c"), s2));
        assert_eq!(a.delta_from(s0, s1).len(), 2);
        assert_eq!(a.delta_from(s0, s2).len(), 1);
        assert_eq!(a.delta_from(s1, s0).len(), 0);
    }

    #[test]
    fn duplicate_owns_fresh_states() {
        let mut a = Automaton::new();
        let s = a.add_state(true, false);
        let t = a.add_state(false, true);
        let _ = a.add_transition(Transition::new(s, Label::prob("a", 0.5), t));
        let b = a.duplicate();
        assert_eq!(b.state_count(), 2);
        assert_eq!(b.transition_count(), 1);
        assert!(b.accept(&["a"]));
        // states of the source automaton are foreign to the copy
        let mut b = b;
        assert!(b.add_transition(Transition::new(s, Label::plain("a"), t)).is_err());
    }
}
