//! Active learning in the style of Angluin's L*. A learner owns an [`ObservationTable`] and
//! poses membership queries through a [`MembershipOracle`] until the table is closed. The
//! resulting hypothesis is then handed to an [`EquivalenceOracle`], which either accepts it or
//! returns a counterexample that is processed after Rivest and Schapire.

mod oracle;
pub use oracle::*;

mod cache;
pub use cache::QueryCache;

mod hypothesis;
pub use hypothesis::Hypothesis;

mod observationtable;
pub use observationtable::{Closedness, ObservationTable};

/// Search for the breakpoint of a counterexample.
pub mod counterexample;

mod lstar;
pub use lstar::{DfaLearner, LStar, LStarHypothesis, MealyLearner};

mod dfa;
mod mealy;

mod faststart;
pub use faststart::{FastStart, SeedAutomaton};

mod sfa;
pub use sfa::{SfaLearner, SfaTable, TrainingData};
