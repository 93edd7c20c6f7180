use criterion::{black_box, criterion_group, criterion_main, Criterion};

use opat::automata::automaton::{Automaton, Label, Transition};
use opat::automata::determinize::determinize;
use opat::automata::product::sync_product;
use opat::probability::reach_probability;

// A nondeterministic chain: every layer forks on the same letter, so the
// subset construction has real work to do.
fn nondet_chain(n: usize) -> Automaton {
    let mut a = Automaton::new();
    let mut prev = a.add_state(true, false);
    for i in 0..n {
        let upper = a.add_state(false, i + 1 == n);
        let lower = a.add_state(false, false);
        let _ = a.add_transition(Transition::new(prev, Label::plain("a"), upper));
        let _ = a.add_transition(Transition::new(prev, Label::plain("a"), lower));
        let _ = a.add_transition(Transition::new(lower, Label::plain("b"), upper));
        prev = upper;
    }
    a
}

fn prob_chain(n: usize) -> Automaton {
    let mut a = Automaton::new();
    let mut prev = a.add_state(true, false);
    for i in 0..n {
        let next = a.add_state(false, i + 1 == n);
        let _ = a.add_transition(Transition::new(prev, Label::prob("a", 0.4), next));
        let _ = a.add_transition(Transition::new(prev, Label::prob("b", 0.6), next));
        prev = next;
    }
    a
}

fn any_word_class(n: usize) -> Automaton {
    let mut a = Automaton::new();
    let mut prev = a.add_state(true, false);
    for i in 0..n {
        let next = a.add_state(false, i + 1 == n);
        let _ = a.add_transition(Transition::new(prev, Label::plain("a"), next));
        let _ = a.add_transition(Transition::new(prev, Label::plain("b"), next));
        prev = next;
    }
    a
}

fn bench_determinize(c: &mut Criterion) {
    let a = nondet_chain(32);
    c.bench_function("determinize nondet chain 32", |b| {
        b.iter(|| determinize(black_box(&a)))
    });
}

fn bench_sync_product(c: &mut Criterion) {
    let system = prob_chain(64);
    let class = any_word_class(64);
    c.bench_function("sync product chain 64", |b| {
        b.iter(|| sync_product(black_box(&system), black_box(&class)))
    });
}

fn bench_reach_probability(c: &mut Criterion) {
    let system = prob_chain(64);
    c.bench_function("reach probability chain 64", |b| {
        b.iter(|| reach_probability(black_box(&system)))
    });
}

criterion_group!(benches, bench_determinize, bench_sync_product, bench_reach_probability);
criterion_main!(benches);
