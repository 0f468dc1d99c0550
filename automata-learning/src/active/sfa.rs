use std::time::Instant;

use lightbulb_automata::prelude::*;
use tracing::{debug, info, trace};

use crate::{LearnerConfig, LearningError, OracleError, Statistics};

use super::{
    counterexample::rivest_schapire,
    faststart::{FastStart, SeedAutomaton},
    Closedness, Equivalence, EquivalenceOracle, Hypothesis, MembershipOracle, ObservationTable,
};

/// Observations of the transitions leaving one access row: the access row of the target class
/// together with the symbols for which the transition has been observed.
pub type TrainingData = Vec<(Word, Vec<char>)>;

/// An observation table for learning symbolic automata. Extension rows are only added for symbols
/// that are known to matter, so in addition to the classes the table keeps for every access row
/// the observed transitions, grouped by target, as training data for the predicates.
#[derive(Clone)]
pub struct SfaTable {
    table: ObservationTable<bool>,
    training_data: math::Map<Word, TrainingData>,
}

impl Default for SfaTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SfaTable {
    /// Creates a table with the empty word as only row and column.
    pub fn new() -> Self {
        Self {
            table: ObservationTable::with_experiments([vec![]]),
            training_data: math::Map::default(),
        }
    }

    pub fn table(&self) -> &ObservationTable<bool> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ObservationTable<bool> {
        &mut self.table
    }

    /// Checks closedness of the underlying table and rebuilds the training data.
    pub fn is_closed(&mut self) -> Closedness {
        let closedness = self.table.is_closed();
        self.rebuild_training_data();
        closedness
    }

    /// The training data of `row` as computed by the last closedness check. Groups are ordered by
    /// the position of the row through which they were first observed.
    pub fn training_data(&self, row: &[char]) -> &[(Word, Vec<char>)] {
        self.training_data
            .get(row)
            .map(|data| data.as_slice())
            .unwrap_or_default()
    }

    fn rebuild_training_data(&mut self) {
        let mut data: math::Map<Word, TrainingData> = math::Map::default();
        for row in self.table.rows() {
            let Some((&sym, parent)) = row.split_last() else {
                continue;
            };
            if !self.table.is_access_row(parent) {
                continue;
            }
            let Some(target) = self.table.equivalence_class(row) else {
                continue;
            };
            let groups = data.entry(parent.to_vec()).or_default();
            match groups.iter_mut().find(|(t, _)| t == target) {
                Some((_, symbols)) => symbols.push(sym),
                None => groups.push((target.clone(), vec![sym])),
            }
        }
        self.training_data = data;
    }

    /// Picks the group that becomes the sink edge of `row`: the one with the most symbols, among
    /// those a self loop and among those the group observed first.
    pub fn sink_group(&self, row: &[char]) -> Option<usize> {
        self.training_data(row)
            .iter()
            .enumerate()
            .max_by(|(i, (lt, ls)), (j, (rt, rs))| {
                ls.len()
                    .cmp(&rs.len())
                    .then((lt.as_slice() == row).cmp(&(rt.as_slice() == row)))
                    .then(j.cmp(i))
            })
            .map(|(i, _)| i)
    }

    /// Builds a symbolic hypothesis from the closed table. Every group of the training data
    /// becomes an edge guarded by exactly the observed symbols, except for the sink group which
    /// additionally receives all symbols that were not observed.
    pub fn hypothesis(&self, alphabet: &CharAlphabet) -> Option<Sfa> {
        let epsilon = self.table.experiment_index(&[])?;
        let access = self.table.access_rows();
        let states: math::Bijection<Word, StateIndex> =
            access.iter().cloned().enumerate().map(|(q, row)| (row, q)).collect();
        let index = |row: &Word| states.get_by_left(row).copied();

        let mut sfa = Sfa::for_alphabet(alphabet.clone());
        for (i, row) in access.iter().enumerate() {
            let accepting = *self.table.get(row, epsilon)?;
            if i == 0 {
                sfa.set_accepting(0, accepting);
            } else {
                sfa.add_state(accepting);
            }
        }

        for (q, row) in access.iter().enumerate() {
            let groups = self.training_data(row);
            let Some(sink) = self.sink_group(row) else {
                sfa.add_sink_edge(q, Predicate::top(alphabet), q);
                continue;
            };
            let mut explicit = Predicate::default();
            for (i, (target, symbols)) in groups.iter().enumerate() {
                if i != sink {
                    let guard = Predicate::new(symbols.iter().copied());
                    explicit = explicit.union(&guard);
                    sfa.add_edge(q, guard, index(target)?);
                }
            }
            let remaining = explicit.complement(alphabet);
            sfa.add_sink_edge(q, remaining, index(&groups[sink].0)?);
        }
        debug_assert_eq!(sfa.check_partition(), Ok(()));
        Some(sfa)
    }
}

impl std::fmt::Debug for SfaTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.table)
    }
}

/// Learns a symbolic automaton. Instead of one extension row per symbol, every access row gets a
/// single extension for a representative symbol. Counterexamples either add a row for the
/// transition they implicate, which refines a predicate, or a column.
pub struct SfaLearner<M, E> {
    alphabet: CharAlphabet,
    oracle: M,
    equivalence: E,
    table: SfaTable,
    config: LearnerConfig,
    iterations: usize,
    equivalence_queries: usize,
}

impl<M, E> SfaLearner<M, E>
where
    M: MembershipOracle<Output = bool>,
    E: EquivalenceOracle<Sfa>,
{
    pub fn new(alphabet: CharAlphabet, oracle: M, equivalence: E) -> Self {
        let mut table = SfaTable::new();
        if let Some(sym) = alphabet.first() {
            table.table_mut().add_extension_row(vec![sym]);
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

    /// Initializes the table from a seed automaton, see [`FastStart`]. Besides the representative
    /// symbol, every access row receives one extension per explicit edge that the seed has in the
    /// corresponding state.
    pub fn with_seed<S: SeedAutomaton + ?Sized>(mut self, seed: &S) -> Self {
        let start = FastStart::new(seed, &self.alphabet);
        let symbolic = Sfa::from_dfa(start.automaton());

        for access in start.access_rows() {
            self.table.table_mut().add_access_row(access.clone());
        }
        for access in start.access_rows() {
            let mut symbols: Vec<char> = self.alphabet.first().into_iter().collect();
            if let Some(state) = symbolic.reached_state_index(access) {
                symbols.extend(
                    symbolic
                        .edges_from(state)
                        .iter()
                        .filter(|e| !e.sink)
                        .filter_map(|e| e.predicate.symbols().next()),
                );
            }
            for sym in symbols {
                let mut extension = access.clone();
                extension.push(sym);
                self.table.table_mut().add_extension_row(extension);
            }
        }
        for experiment in start.experiments() {
            self.table.table_mut().add_experiment(experiment.clone());
        }
        self
    }

    pub fn table(&self) -> &SfaTable {
        &self.table
    }

    pub fn statistics(&self) -> Statistics {
        self.oracle
            .statistics()
            .with("equivalence queries", self.equivalence_queries)
            .with("iterations", self.iterations)
            .with("states", self.table.table().access_rows().len())
            .with("experiments", self.table.table().experiments().len())
    }

    /// Runs the learning loop until the equivalence oracle accepts a hypothesis.
    pub fn learn(&mut self) -> Result<Sfa, LearningError> {
        let start = Instant::now();

        while self.iterations < self.config.max_iterations {
            self.iterations += 1;
            self.fill()?;
            trace!("SFA iteration {} with table\n{:?}", self.iterations, self.table);

            if let Closedness::NotClosed(row) = self.table.is_closed() {
                debug!("table is not closed, promoting {}", row.show());
                self.promote(row);
                continue;
            }

            let Some(hypothesis) = self.table.hypothesis(&self.alphabet) else {
                debug!("no conjecture possible from the table");
                continue;
            };

            self.equivalence_queries += 1;
            match self.equivalence.check(&hypothesis, &mut self.oracle)? {
                Equivalence::Correct => {
                    info!(
                        "SFA learner finished with {} states in {}ms ({})",
                        hypothesis.size(),
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
            .table_mut()
            .fill_missing(|row, experiment| oracle.query(&[row, experiment].concat()))
    }

    fn promote(&mut self, row: Word) {
        let table = self.table.table_mut();
        table.promote(&row);
        if let Some(sym) = self.alphabet.first() {
            let mut extension = row;
            extension.push(sym);
            table.add_extension_row(extension);
        }
    }

    fn process_counterexample(&mut self, hypothesis: &Sfa, word: Word) -> Result<(), LearningError> {
        if let Some(symbol) = self.alphabet.foreign_symbol(&word) {
            return Err(LearningError::ForeignSymbol { symbol });
        }
        let access = self.table.table().access_rows().to_vec();
        let oracle = &mut self.oracle;
        let breakpoint = rivest_schapire(word.len(), |i| {
            let state = hypothesis.reached_index(&word[..i]);
            oracle.query(&[access[state].as_slice(), &word[i..]].concat())
        })?;
        let Some(i) = breakpoint else {
            return Err(LearningError::InconsistentCounterexample { word });
        };

        let mut transition = access[hypothesis.reached_index(&word[..i])].clone();
        transition.push(word[i]);
        let table = self.table.table_mut();
        if table.contains_row(&transition) {
            let suffix = word[i + 1..].to_vec();
            trace!(
                "transition {} is known, adding experiment {}",
                transition.show(),
                suffix.show()
            );
            if !table.add_experiment(suffix) {
                return Err(LearningError::InconsistentCounterexample { word });
            }
        } else {
            trace!("adding row for transition {}", transition.show());
            table.add_extension_row(transition);
        }
        Ok(())
    }
}

impl<M, E> std::fmt::Debug for SfaLearner<M, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.table)
    }
}

#[cfg(test)]
mod tests {
    use lightbulb_automata::prelude::*;

    use super::SfaTable;
    use crate::active::{DfaOracle, ExhaustiveOracle, QueryCache, SfaLearner};

    fn contains(alphabet: CharAlphabet, sym: char) -> DFA {
        let mut dfa = DFA::for_alphabet(alphabet.clone());
        let seen = dfa.add_state(true);
        for a in alphabet.universe() {
            dfa.add_edge(0, a, if a == sym { seen } else { 0 });
            dfa.add_edge(seen, a, seen);
        }
        dfa
    }

    #[test_log::test]
    fn learn_contains_lt() {
        let alphabet = CharAlphabet::printable_ascii();
        let target = contains(alphabet.clone(), '<');
        let mut learner = SfaLearner::new(
            alphabet.clone(),
            QueryCache::new(DfaOracle::new(target.clone())),
            DfaOracle::new(target.clone()),
        );
        let learned = learner.learn().unwrap();
        assert_eq!(learned.size(), 2);
        assert_eq!(learned.check_partition(), Ok(()));
        assert!(learned.to_dfa().equivalent(&target));
        assert!(learned.consume_input("a<b"));
        assert!(!learned.consume_input("ab>"));

        let queries: usize = learner
            .statistics()
            .get("membership queries")
            .unwrap()
            .parse()
            .unwrap();
        assert!(queries < alphabet.size() / 4, "posed {queries} queries");
    }

    #[test_log::test]
    fn learn_contains_ab_symbolically() {
        let alphabet = CharAlphabet::from("abcd");
        let target = DFA::builder()
            .with_state_colors([false, false, true])
            .with_alphabet_symbols(alphabet.universe())
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 0),
                (0, 'c', 0),
                (0, 'd', 0),
                (1, 'a', 1),
                (1, 'b', 2),
                (1, 'c', 0),
                (1, 'd', 0),
                (2, 'a', 2),
                (2, 'b', 2),
                (2, 'c', 2),
                (2, 'd', 2),
            ])
            .into_dfa(0);
        let learned = SfaLearner::new(
            alphabet,
            QueryCache::new(DfaOracle::new(target.clone())),
            ExhaustiveOracle::new(5),
        )
        .learn()
        .unwrap();
        assert!(learned.to_dfa().equivalent(&target));
    }

    #[test]
    fn learn_with_seed() {
        let alphabet = CharAlphabet::from("xyz<");
        let target = contains(alphabet.clone(), '<');
        let seed = contains(alphabet.clone(), 'x');
        let mut learner = SfaLearner::new(
            alphabet,
            QueryCache::new(DfaOracle::new(target.clone())),
            DfaOracle::new(target.clone()),
        )
        .with_seed(&seed);
        assert_eq!(learner.table().table().access_rows().len(), 2);
        assert!(learner.learn().unwrap().to_dfa().equivalent(&target));
    }

    #[test]
    fn sink_tie_break() {
        let mut table = SfaTable::new();
        {
            let inner = table.table_mut();
            inner.add_extension_row(vec!['a']);
            inner.add_extension_row(vec!['b']);
            inner.set(&[], 0, false);
            inner.set(&['a'], 0, true);
            inner.set(&['b'], 0, false);
            inner.promote(&['a']);
            inner.add_extension_row(vec!['a', 'a']);
            inner.set(&['a', 'a'], 0, true);
        }
        table.is_closed();
        // both groups of the empty word have a single symbol, the self loop wins
        assert_eq!(
            table.training_data(&[]),
            &[(vec!['a'], vec!['a']), (vec![], vec!['b'])]
        );
        assert_eq!(table.sink_group(&[]), Some(1));
        assert_eq!(table.sink_group(&['a']), Some(0));

        let sfa = table.hypothesis(&CharAlphabet::from("abc")).unwrap();
        assert!(sfa.consume_input("ca"));
        assert!(!sfa.consume_input("cbc"));
        assert_eq!(sfa.sink_edge(0).map(|e| e.target), Some(0));
    }
}
