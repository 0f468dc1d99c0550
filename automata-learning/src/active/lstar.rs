use std::time::Instant;

use itertools::Itertools;
use lightbulb_automata::prelude::*;
use tracing::{debug, info, trace};

use crate::{LearnerConfig, LearningError, OracleError, Statistics};

use super::{
    counterexample::rivest_schapire,
    faststart::{FastStart, SeedAutomaton},
    Closedness, Equivalence, EquivalenceOracle, Hypothesis, MembershipOracle, ObservationTable,
};

/// Hooks through which the kinds of hypotheses learned by [`LStar`] differ.
pub trait LStarHypothesis: Hypothesis + Sized {
    /// The experiments every table starts with.
    fn mandatory_experiments(alphabet: &CharAlphabet) -> Vec<Word>;

    /// Computes the table entry for `row` and `experiment`.
    fn entry(
        oracle: &mut dyn MembershipOracle<Output = Self::Output>,
        row: &[char],
        experiment: &[char],
    ) -> Result<Self::Output, OracleError>;

    /// Builds the hypothesis from a closed table, the i-th access row becomes state i. Returns
    /// `None` if the table does not contain enough information.
    fn from_table(alphabet: &CharAlphabet, table: &ObservationTable<Self::Output>) -> Option<Self>;

    /// The value `alpha` used in counterexample processing: `prefix` is read by the hypothesis
    /// and leads to the state with access word `access`, the `suffix` is then answered by the
    /// target from `access`.
    fn decomposition_value(
        &self,
        oracle: &mut dyn MembershipOracle<Output = Self::Output>,
        prefix: &[char],
        access: &[char],
        suffix: &[char],
    ) -> Result<Self::Output, OracleError>;
}

/// An implementation of the L* algorithm with counterexample processing after Rivest and
/// Schapire, every counterexample adds a single column to the table.
pub struct LStar<H: LStarHypothesis, M, E> {
    alphabet: CharAlphabet,
    oracle: M,
    equivalence: E,
    table: ObservationTable<H::Output>,
    config: LearnerConfig,
    iterations: usize,
    equivalence_queries: usize,
}

/// Learns a [`DFA`].
pub type DfaLearner<M, E> = LStar<DFA, M, E>;

/// Learns a [`MealyMachine`].
pub type MealyLearner<M, E> = LStar<MealyMachine, M, E>;

impl<H, M, E> LStar<H, M, E>
where
    H: LStarHypothesis,
    M: MembershipOracle<Output = H::Output>,
    E: EquivalenceOracle<H>,
{
    /// Creates a learner with a blank table: `S = {ε}`, `S·Σ = Σ` and the mandatory experiments.
    pub fn new(alphabet: CharAlphabet, oracle: M, equivalence: E) -> Self {
        let mut table = ObservationTable::with_experiments(H::mandatory_experiments(&alphabet));
        for sym in alphabet.universe() {
            table.add_extension_row(vec![sym]);
        }
        Self {
            alphabet,
            oracle,
            equivalence,
            table,
            config: LearnerConfig::default(),
            iterations: 0,
            equivalence_queries: 0,
        }
    }

    /// Replaces the default [`LearnerConfig`].
    pub fn with_config(self, config: LearnerConfig) -> Self {
        Self { config, ..self }
    }

    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    pub fn table(&self) -> &ObservationTable<H::Output> {
        &self.table
    }

    pub fn oracle(&self) -> &M {
        &self.oracle
    }

    /// The counters of the membership oracle followed by those of the learner.
    pub fn statistics(&self) -> Statistics {
        self.oracle
            .statistics()
            .with("equivalence queries", self.equivalence_queries)
            .with("iterations", self.iterations)
            .with("states", self.table.access_rows().len())
            .with("experiments", self.table.experiments().len())
    }

    /// Runs the learning loop until the equivalence oracle accepts a hypothesis.
    pub fn learn(&mut self) -> Result<H, LearningError> {
        let start = Instant::now();

        while self.iterations < self.config.max_iterations {
            self.iterations += 1;
            self.fill()?;
            trace!("LStar iteration {} with table\n{:?}", self.iterations, self.table);

            if let Closedness::NotClosed(row) = self.table.is_closed() {
                debug!("table is not closed, promoting {}", row.show());
                self.promote(row);
                continue;
            }

            let Some(hypothesis) = H::from_table(&self.alphabet, &self.table) else {
                debug!("no conjecture possible from the table");
                continue;
            };

            self.equivalence_queries += 1;
            match self.equivalence.check(&hypothesis, &mut self.oracle)? {
                Equivalence::Correct => {
                    info!(
                        "LStar learned {} states in {}ms ({})",
                        self.table.access_rows().len(),
                        start.elapsed().as_millis(),
                        self.statistics()
                    );
                    return Ok(hypothesis);
                }
                Equivalence::Halt => return Err(LearningError::Halted),
                Equivalence::Counterexample(word) => {
                    debug!("processing counterexample {}", word.show());
                    self.process_counterexample(&hypothesis, word)?;
                }
            }
        }

        Err(LearningError::DidNotConverge {
            iterations: self.iterations,
        })
    }

    fn fill(&mut self) -> Result<usize, OracleError> {
        let oracle = &mut self.oracle;
        self.table
            .fill_missing(|row, experiment| H::entry(oracle, row, experiment))
    }

    fn promote(&mut self, row: Word) {
        self.table.promote(&row);
        for sym in self.alphabet.universe() {
            let mut extension = row.clone();
            extension.push(sym);
            self.table.add_extension_row(extension);
        }
    }

    fn process_counterexample(&mut self, hypothesis: &H, word: Word) -> Result<(), LearningError> {
        if let Some(symbol) = self.alphabet.foreign_symbol(&word) {
            return Err(LearningError::ForeignSymbol { symbol });
        }
        let access = self.table.access_rows().to_vec();
        let oracle = &mut self.oracle;
        let breakpoint = rivest_schapire(word.len(), |i| {
            let state = hypothesis.reached_index(&word[..i]);
            hypothesis.decomposition_value(oracle, &word[..i], &access[state], &word[i..])
        })?;

        let Some(i) = breakpoint else {
            return Err(LearningError::InconsistentCounterexample { word });
        };
        let suffix = word[i + 1..].to_vec();
        trace!(
            "breakpoint {i} in {}, adding experiment {}",
            word.show(),
            suffix.show()
        );
        if !self.table.add_experiment(suffix) {
            return Err(LearningError::InconsistentCounterexample { word });
        }
        Ok(())
    }
}

impl<M, E> LStar<DFA, M, E>
where
    M: MembershipOracle<Output = bool>,
    E: EquivalenceOracle<DFA>,
{
    /// Initializes the table from a seed automaton instead of starting blank, see [`FastStart`].
    /// Rows and experiments of the blank table are kept.
    pub fn with_seed<S: SeedAutomaton + ?Sized>(mut self, seed: &S) -> Self {
        let start = FastStart::new(seed, &self.alphabet);
        for access in start.access_rows() {
            self.table.add_access_row(access.clone());
        }
        let extensions = start
            .access_rows()
            .iter()
            .cartesian_product(self.alphabet.universe().collect_vec())
            .map(|(access, sym)| {
                let mut extension = access.clone();
                extension.push(sym);
                extension
            })
            .collect_vec();
        for extension in extensions {
            self.table.add_extension_row(extension);
        }
        for experiment in start.experiments() {
            self.table.add_experiment(experiment.clone());
        }
        debug!(
            "fast start with {} access rows and {} experiments",
            start.access_rows().len(),
            start.experiments().len()
        );
        self
    }
}

impl<H, M, E> std::fmt::Debug for LStar<H, M, E>
where
    H: LStarHypothesis,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.table)
    }
}
