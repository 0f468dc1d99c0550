//! A library for actively learning automata from black-box targets and for comparing two
//! targets by learning them side by side.
//!
//! The [`active`] module contains the learners: L* for [`DFA`](lightbulb_automata::DFA)s and
//! [`MealyMachine`](lightbulb_automata::MealyMachine)s and a symbolic variant that learns an
//! [`Sfa`](lightbulb_automata::Sfa) without posing queries for every symbol of a large alphabet.
//! The [`diff`] module runs two learners concurrently and searches for a word on which their
//! targets disagree.
#![allow(missing_docs)]

/// Deals with active learning algorithms such as L*.
pub mod active;

/// Differential learning of two targets.
pub mod diff;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod statistics;
pub use statistics::Statistics;

/// Everything needed to set up a learner or a differential session.
pub mod prelude {
    pub use super::{
        active::{
            DfaLearner, DfaOracle, Equivalence, EquivalenceOracle, ExhaustiveOracle, FnOracle,
            Hypothesis, MealyLearner, MealyOracle, MembershipOracle, QueryCache, SeedAutomaton,
            SfaLearner,
        },
        diff::{DiffOutcome, DiffReport, DiffSession, Role},
        DiffConfig, DiffError, ExposureMode, LearnerConfig, LearnerKind, LearningError,
        OracleError, Statistics,
    };
}
