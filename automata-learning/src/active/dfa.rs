use lightbulb_automata::prelude::*;

use crate::OracleError;

use super::{LStarHypothesis, MembershipOracle, ObservationTable};

impl LStarHypothesis for DFA {
    fn mandatory_experiments(_alphabet: &CharAlphabet) -> Vec<Word> {
        vec![vec![]]
    }

    fn entry(
        oracle: &mut dyn MembershipOracle<Output = bool>,
        row: &[char],
        experiment: &[char],
    ) -> Result<bool, OracleError> {
        oracle.query(&[row, experiment].concat())
    }

    fn from_table(alphabet: &CharAlphabet, table: &ObservationTable<bool>) -> Option<Self> {
        let epsilon = table.experiment_index(&[])?;
        let access = table.access_rows();

        let mut dfa = DFA::for_alphabet(alphabet.clone());
        for (i, row) in access.iter().enumerate() {
            let accepting = *table.get(row, epsilon)?;
            if i == 0 {
                dfa.set_accepting(0, accepting);
            } else {
                dfa.add_state(accepting);
            }
        }

        for (q, row) in access.iter().enumerate() {
            for sym in alphabet.universe() {
                let extension: Word = row.iter().copied().chain([sym]).collect();
                let target = table.class_index(&extension)?;
                dfa.add_edge(q, sym, target);
            }
        }
        Some(dfa)
    }

    fn decomposition_value(
        &self,
        oracle: &mut dyn MembershipOracle<Output = bool>,
        _prefix: &[char],
        access: &[char],
        suffix: &[char],
    ) -> Result<bool, OracleError> {
        oracle.query(&[access, suffix].concat())
    }
}

#[cfg(test)]
mod tests {
    use lightbulb_automata::prelude::*;

    use crate::{
        active::{DfaLearner, DfaOracle, ExhaustiveOracle, FnOracle, QueryCache},
        LearnerConfig, LearningError,
    };

    fn contains_ab() -> DFA {
        DFA::builder()
            .with_state_colors([false, false, true])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 0),
                (1, 'a', 1),
                (1, 'b', 2),
                (2, 'a', 2),
                (2, 'b', 2),
            ])
            .into_dfa(0)
    }

    #[test_log::test]
    fn learn_contains_ab() {
        let target = contains_ab();
        let alphabet = target.alphabet().clone();
        let mut learner = DfaLearner::new(
            alphabet,
            QueryCache::new(DfaOracle::new(target.clone())),
            DfaOracle::new(target.clone()),
        );
        let learned = learner.learn().unwrap();

        for word in ["ab", "aab", "abb"] {
            assert!(learned.consume_input(word), "should accept {word}");
        }
        for word in ["", "a", "b", "ba", "bb"] {
            assert!(!learned.consume_input(word), "should reject {word}");
        }
        assert_eq!(learned.size(), 3);
        assert!(learned.equivalent(&target));
        assert!(learner.statistics().get("membership queries").is_some());
    }

    #[test_log::test]
    fn learn_with_black_box_equivalence() {
        let target = contains_ab();
        let learned = DfaLearner::new(
            target.alphabet().clone(),
            FnOracle::new(|w: &[char]| w.windows(2).any(|x| x == ['a', 'b'])),
            ExhaustiveOracle::new(5),
        )
        .learn()
        .unwrap();
        assert!(learned.equivalent(&target));
    }

    #[test_log::test]
    fn learn_random_dfas() {
        fastrand::seed(17);
        for _ in 0..25 {
            let target = lightbulb_automata::random::generate_random_dfa(2, 0.3);
            let learned = DfaLearner::new(
                target.alphabet().clone(),
                QueryCache::new(DfaOracle::new(target.clone())),
                DfaOracle::new(target.clone()),
            )
            .learn()
            .unwrap();
            assert_eq!(learned.difference(&target).shortest_string(), None);
            assert_eq!(target.difference(&learned).shortest_string(), None);
            assert_eq!(learned.size(), target.minimize().completed().size());
        }
    }

    #[test]
    fn learn_with_seed() {
        let target = contains_ab();
        let seed = DFA::from_words(target.alphabet().clone(), ["ab"]);
        let mut learner = DfaLearner::new(
            target.alphabet().clone(),
            QueryCache::new(DfaOracle::new(target.clone())),
            DfaOracle::new(target.clone()),
        )
        .with_seed(&seed);
        assert!(learner.table().access_rows().len() > 1);
        assert!(learner.learn().unwrap().equivalent(&target));
    }

    #[test]
    fn iteration_limit() {
        let target = contains_ab();
        let result = DfaLearner::new(
            target.alphabet().clone(),
            DfaOracle::new(target.clone()),
            DfaOracle::new(target.clone()),
        )
        .with_config(LearnerConfig::default().with_max_iterations(1))
        .learn();
        assert_eq!(result, Err(LearningError::DidNotConverge { iterations: 1 }));
    }
}
