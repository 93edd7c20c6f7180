use clap::clap_app;
use std::fs::File;
use std::io::Write;

use petgraph::dot::Dot;

use opat::automata::automaton::{Automaton, Label, Transition};
use opat::automata::product::sync_product;
use opat::model::read_problem_json;
use opat::opacity::Opacity;

fn main() {
    let matches = clap_app!(opat =>
        (version: "0.1")
        (about: "Probabilistic opacity measures over finite automata")
        (@arg MODEL: -m --model +takes_value "JSON problem description with a \
        probabilistic system automaton, a partition of observations and a predicate, e.g.
        {
          \"system\": {
            \"states\": [0,1,2],
            \"initial\": [0],
            \"terminal\": [1,2],
            \"delta\": [
              {\"q\": 0, \"a\": \"a\", \"p\": 0.3, \"q_prime\": 1},
              {\"q\": 0, \"a\": \"b\", \"p\": 0.7, \"q_prime\": 2}
            ]
          },
          \"observations\": [...],
          \"predicate\": {...}
        }")
        (@arg GRAPH: -g --graph "Write dot graphs of the system and of the observation products")
    )
    .get_matches();

    let mut opacity = match matches.value_of("MODEL") {
        Some(path) => {
            let def = match read_problem_json(path) {
                Ok(def) => def,
                Err(e) => {
                    println!("Error: {}", e);
                    return;
                }
            };
            match def.build() {
                Ok(opacity) => opacity,
                Err(e) => {
                    println!("Error: {}", e);
                    return;
                }
            }
        }
        None => example_problem(),
    };

    if let Err(e) = opacity.validate_data() {
        println!("Error: {}", e);
        return;
    }

    if matches.is_present("GRAPH") {
        write_graphs(&opacity);
    }

    let computed = opacity
        .compute_lpo()
        .and(opacity.compute_rpo())
        .and(opacity.compute_vpo());
    if let Err(e) = computed {
        println!("Error: {}", e);
        return;
    }

    println!("LPO : {}", opacity.lpo());
    println!("RPO : {}", opacity.rpo());
    println!("VPO : {}", opacity.vpo());
    println!("Initial entropy : {}", opacity.initial_entropy());
    println!("Remaining entropy : {}", opacity.remaining_entropy());
    println!("Mutual information : {}", opacity.mutual_information());
}

fn write_graphs(opacity: &Opacity) {
    let g = opacity.automaton().generate_graph();
    let dot = format!("{}", Dot::new(&g));
    let mut file = File::create("system.dot").unwrap();
    file.write_all(dot.as_bytes()).unwrap();

    for (i, o) in opacity.observations().iter().enumerate() {
        if let Some(product) = sync_product(opacity.automaton(), o) {
            let g = product.generate_graph();
            let dot = format!("{}", Dot::new(&g));
            let mut file = File::create(format!("product_obs{}.dot", i)).unwrap();
            file.write_all(dot.as_bytes()).unwrap();
        }
    }
}

// Two-branch system taking "a" with probability 0.3 and "b" with 0.7, the
// observer distinguishing the two letters and the secret being the "a"
// branch.
fn example_problem() -> Opacity {
    let mut system = Automaton::new();
    let s0 = system.add_state(true, false);
    let s1 = system.add_state(false, true);
    let s2 = system.add_state(false, true);
    let _ = system.add_transition(Transition::new(s0, Label::prob("a", 0.3), s1));
    let _ = system.add_transition(Transition::new(s0, Label::prob("b", 0.7), s2));

    let observations = vec![
        Automaton::word_automaton(&["a"]),
        Automaton::word_automaton(&["b"]),
    ];
    let phi = Automaton::word_automaton(&["a"]);

    Opacity::new(system, observations, phi)
}
