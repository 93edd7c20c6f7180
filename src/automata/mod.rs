pub mod automaton;
pub mod determinize;
pub mod ops;
pub mod product;
pub mod properties;
