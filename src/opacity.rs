use std::error::Error;
use std::fmt;

use crate::automata::automaton::Automaton;
use crate::automata::determinize::complement;
use crate::automata::ops::{union, unprob};
use crate::automata::product::{intersection, sync_product};
use crate::automata::properties::{inclusion, is_empty};
use crate::probability::{reach_probability, SolveError};

/// Sentinel stored in the cached metric fields before the corresponding
/// compute step has run.
pub const NOT_COMPUTED: f64 = -1.0;

/// A consistency violation reported by [`Opacity::validate_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncorrectDataError(pub String);

impl fmt::Display for IncorrectDataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "incorrect data: {}", self.0)
    }
}

impl Error for IncorrectDataError {}

/// Failure of a metric computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpacityError {
    /// The system automaton carries no probabilistic transition, so the
    /// synchronized product is inapplicable.
    NotProbabilistic,
    Solve(SolveError),
}

impl fmt::Display for OpacityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpacityError::NotProbabilistic => {
                write!(f, "system automaton has no probabilistic transitions")
            }
            OpacityError::Solve(e) => write!(f, "{}", e),
        }
    }
}

impl Error for OpacityError {}

impl From<SolveError> for OpacityError {
    fn from(e: SolveError) -> OpacityError {
        OpacityError::Solve(e)
    }
}

/// An opacity problem instance: the system automaton, the partition of its
/// observable behavior into observation classes, and the predicate automaton
/// marking the secret.
///
/// Metric results are cached in plain fields initialized to
/// [`NOT_COMPUTED`]; they are overwritten by the compute methods and never
/// invalidated implicitly. [`Opacity::validate_data`] is expected to be
/// called once before any metric computation.
pub struct Opacity {
    automaton: Automaton,
    observations: Vec<Automaton>,
    phi: Automaton,
    initial_entropy: f64,
    remaining_entropy: f64,
    mutual_information: f64,
    lpo: f64,
    rpo: f64,
    vpo: f64,
}

impl Opacity {
    pub fn new(automaton: Automaton, observations: Vec<Automaton>, phi: Automaton) -> Opacity {
        Opacity {
            automaton,
            observations,
            phi,
            initial_entropy: NOT_COMPUTED,
            remaining_entropy: NOT_COMPUTED,
            mutual_information: NOT_COMPUTED,
            lpo: NOT_COMPUTED,
            rpo: NOT_COMPUTED,
            vpo: NOT_COMPUTED,
        }
    }

    fn sync_probability(&self, b: &Automaton) -> Result<f64, OpacityError> {
        let product = sync_product(&self.automaton, b).ok_or(OpacityError::NotProbabilistic)?;
        Ok(reach_probability(&product)?)
    }

    // P(φ ∧ o): the observation is synchronized on top of the system/φ
    // product.
    fn phi_and_obs_probability(&self, obs: &Automaton) -> Result<f64, OpacityError> {
        let with_phi =
            sync_product(&self.automaton, &self.phi).ok_or(OpacityError::NotProbabilistic)?;
        let product = sync_product(&with_phi, obs).ok_or(OpacityError::NotProbabilistic)?;
        Ok(reach_probability(&product)?)
    }

    /// Liberal probabilistic opacity: the probability mass of the
    /// observation classes that determine the secret, i.e. those included in
    /// the predicate or in its complement.
    pub fn compute_lpo(&mut self) -> Result<f64, OpacityError> {
        let phi_complement = complement(&self.phi);

        let mut opacity = 0.0;
        for o in &self.observations {
            if inclusion(o, &self.phi) || inclusion(o, &phi_complement) {
                opacity += self.sync_probability(o)?;
            }
        }

        self.lpo = opacity;
        Ok(opacity)
    }

    /// Asymmetrical liberal opacity: only observations included in the
    /// predicate itself contribute. Not cached.
    pub fn compute_lpo_asym(&self) -> Result<f64, OpacityError> {
        let mut opacity = 0.0;
        for o in &self.observations {
            if inclusion(o, &self.phi) {
                opacity += self.sync_probability(o)?;
            }
        }
        Ok(opacity)
    }

    /// Restrictive probabilistic opacity, through the mutual information
    /// between the secret and the observation: `RPO = 1 - I(φ; O)` where
    /// `I = H(φ) - H(φ|O)`. Also caches the initial entropy, the remaining
    /// entropy and the mutual information.
    pub fn compute_rpo(&mut self) -> Result<f64, OpacityError> {
        let p_phi = self.sync_probability(&self.phi)?;
        let p_phi_complement = reach_probability(&self.automaton)? - p_phi;

        let mut initial_entropy = 0.0;
        if p_phi != 1.0 && p_phi != 0.0 {
            initial_entropy -= p_phi * p_phi.log2();
            initial_entropy -= p_phi_complement * p_phi_complement.log2();
        }

        let mut remaining_entropy = 0.0;
        for o in &self.observations {
            let p_obs = self.sync_probability(o)?;
            if p_obs == 0.0 {
                continue;
            }
            let p_phi_and_obs = self.phi_and_obs_probability(o)?;
            let p_phi_comp_and_obs = p_obs - p_phi_and_obs;

            if p_phi_and_obs != 0.0 {
                remaining_entropy -= p_phi_and_obs * (p_phi_and_obs / p_obs).log2();
            }
            if p_phi_comp_and_obs != 0.0 {
                remaining_entropy -= p_phi_comp_and_obs * (p_phi_comp_and_obs / p_obs).log2();
            }
        }

        self.initial_entropy = initial_entropy;
        self.remaining_entropy = remaining_entropy;
        self.mutual_information = initial_entropy - remaining_entropy;
        self.rpo = 1.0 - self.mutual_information;
        Ok(self.rpo)
    }

    /// Vulnerable probabilistic opacity:
    /// `VPO = -1 / Σ P(o)·log₂(1 - v(o))` with
    /// `v(o) = max(P(φ∧o), P(¬φ∧o)) / P(o)`. An observation with `v(o) = 1`
    /// drives the sum to -∞; the formula is kept as is.
    pub fn compute_vpo(&mut self) -> Result<f64, OpacityError> {
        let mut sum = 0.0;
        for o in &self.observations {
            let p_obs = self.sync_probability(o)?;
            if p_obs == 0.0 {
                continue;
            }
            let p_phi_and_obs = self.phi_and_obs_probability(o)?;
            let p_phi_comp_and_obs = p_obs - p_phi_and_obs;

            let vulnerability = p_phi_and_obs.max(p_phi_comp_and_obs) / p_obs;
            sum += p_obs * (1.0 - vulnerability).log2();
        }

        self.vpo = -1.0 / sum;
        Ok(self.vpo)
    }

    /// Harmonic probabilistic opacity:
    /// `HPO = 1 / Σ P(o) / (P(¬φ∧o) / P(o))`. Not cached.
    pub fn compute_hpo(&self) -> Result<f64, OpacityError> {
        let mut sum = 0.0;
        for o in &self.observations {
            let p_obs = self.sync_probability(o)?;
            if p_obs == 0.0 {
                continue;
            }
            let p_phi_and_obs = self.phi_and_obs_probability(o)?;
            let p_phi_comp_and_obs = p_obs - p_phi_and_obs;

            sum += p_obs / (p_phi_comp_and_obs / p_obs);
        }
        Ok(1.0 / sum)
    }

    /// Checks the consistency of the problem instance. Must be called once
    /// before any metric computation; the first failing check wins.
    pub fn validate_data(&self) -> Result<(), IncorrectDataError> {
        if self.observations.is_empty() {
            return Err(IncorrectDataError("No observable defined.".to_string()));
        }

        let a = unprob(&self.automaton);

        // the union of the observation classes must cover exactly the
        // system's behavior
        let mut all_obs = Automaton::new();
        for o in &self.observations {
            all_obs = union(&all_obs, o);
        }
        if !inclusion(&a, &all_obs) || !inclusion(&all_obs, &a) {
            return Err(IncorrectDataError(
                "The union of observables should equal the automaton.".to_string(),
            ));
        }

        if !inclusion(&self.phi, &a) {
            return Err(IncorrectDataError(
                "The automaton doesn't include the predicate.".to_string(),
            ));
        }

        for i in 0..self.observations.len() {
            for j in i + 1..self.observations.len() {
                if !is_empty(&intersection(&self.observations[j], &self.observations[i])) {
                    return Err(IncorrectDataError(format!(
                        "Collision between observables {} and {}",
                        i, j
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn observations(&self) -> &[Automaton] {
        &self.observations
    }

    pub fn phi(&self) -> &Automaton {
        &self.phi
    }

    pub fn initial_entropy(&self) -> f64 {
        self.initial_entropy
    }

    pub fn remaining_entropy(&self) -> f64 {
        self.remaining_entropy
    }

    pub fn mutual_information(&self) -> f64 {
        self.mutual_information
    }

    pub fn lpo(&self) -> f64 {
        self.lpo
    }

    pub fn rpo(&self) -> f64 {
        self.rpo
    }

    pub fn vpo(&self) -> f64 {
        self.vpo
    }
}
