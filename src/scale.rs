use std::time::Instant;

use ndarray::Array1;
use ndarray_stats::QuantileExt;
use rand::Rng;

use opat::automata::automaton::{Automaton, Label, Transition};
use opat::opacity::Opacity;

// -------------------------------
// Model-size scalability sweep
// -------------------------------
// Builds first-letter-partitioned ladder systems of growing depth, times the
// RPO computation and writes one csv row per size.

fn main() {
    let sizes: Vec<usize> = vec![2, 4, 8, 16, 32, 64];
    let samples: usize = 5;
    let mut rng = rand::thread_rng();

    let mut wtr = match csv::Writer::from_path("scale.csv") {
        Ok(w) => w,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    wtr.write_record(&["states", "min_s", "mean_s", "max_s"]).unwrap();

    for n in sizes {
        let mut durations: Vec<f64> = Vec::with_capacity(samples);
        for _ in 0..samples {
            let mut opacity = ladder_problem(n, &mut rng);
            let start = Instant::now();
            match opacity.compute_rpo() {
                Ok(_) => durations.push(start.elapsed().as_secs_f64()),
                Err(e) => {
                    println!("Error at size {}: {}", n, e);
                    return;
                }
            }
        }
        let stats = Array1::from(durations);
        let min = *stats.min().unwrap();
        let max = *stats.max().unwrap();
        let mean = stats.mean().unwrap();
        println!("n: {}, mean duration: {}", n, mean);
        wtr.write_record(&[
            (n + 1).to_string(),
            min.to_string(),
            mean.to_string(),
            max.to_string(),
        ])
        .unwrap();
    }
    wtr.flush().unwrap();
}

/// A depth-`n` ladder: every layer branches on "a" or "b" with a random
/// split, the bottom state is terminal. The observer distinguishes the first
/// letter, the secret is the "a"-first behavior.
fn ladder_problem<R: Rng>(n: usize, rng: &mut R) -> Opacity {
    let mut system = Automaton::new();
    let mut prev = system.add_state(true, false);
    for i in 0..n {
        let next = system.add_state(false, i + 1 == n);
        let p: f64 = rng.gen_range(0.05, 0.95);
        let _ = system.add_transition(Transition::new(prev, Label::prob("a", p), next));
        let _ = system.add_transition(Transition::new(prev, Label::prob("b", 1.0 - p), next));
        prev = next;
    }

    let observations = vec![first_letter_class("a", n), first_letter_class("b", n)];
    let phi = first_letter_class("a", n);
    Opacity::new(system, observations, phi)
}

// Words of length n starting with `first`, then any mix of "a" and "b".
fn first_letter_class(first: &str, n: usize) -> Automaton {
    let mut auto = Automaton::new();
    let mut prev = auto.add_state(true, false);
    for i in 0..n {
        let next = auto.add_state(false, i + 1 == n);
        if i == 0 {
            let _ = auto.add_transition(Transition::new(prev, Label::plain(first), next));
        } else {
            let _ = auto.add_transition(Transition::new(prev, Label::plain("a"), next));
            let _ = auto.add_transition(Transition::new(prev, Label::plain("b"), next));
        }
        prev = next;
    }
    auto
}
