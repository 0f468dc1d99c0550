use lightbulb_automata::{math::longest_common_prefix, prelude::*};

use crate::OracleError;

use super::{Hypothesis, LStarHypothesis, MembershipOracle, ObservationTable};

/// Strips the output on `prefix` from the output on `prefix·suffix`.
fn output_suffix(
    oracle: &mut dyn MembershipOracle<Output = String>,
    prefix: &[char],
    suffix: &[char],
) -> Result<String, OracleError> {
    let own = oracle.query(prefix)?;
    let full = oracle.query(&[prefix, suffix].concat())?;
    Ok(full
        .chars()
        .skip(longest_common_prefix(&own, &full))
        .collect())
}

impl LStarHypothesis for MealyMachine {
    fn mandatory_experiments(alphabet: &CharAlphabet) -> Vec<Word> {
        alphabet.universe().map(|sym| vec![sym]).collect()
    }

    fn entry(
        oracle: &mut dyn MembershipOracle<Output = String>,
        row: &[char],
        experiment: &[char],
    ) -> Result<String, OracleError> {
        output_suffix(oracle, row, experiment)
    }

    fn from_table(alphabet: &CharAlphabet, table: &ObservationTable<String>) -> Option<Self> {
        let access = table.access_rows();
        let mut mm = MealyMachine::for_alphabet(alphabet.clone());
        for _ in 1..access.len() {
            mm.add_state();
        }

        for (q, row) in access.iter().enumerate() {
            for sym in alphabet.universe() {
                let extension: Word = row.iter().copied().chain([sym]).collect();
                let target = table.class_index(&extension)?;
                let output = table.get(row, table.experiment_index(&[sym])?)?;
                mm.add_transition(q, sym, output.as_str(), target);
            }
        }
        Some(mm)
    }

    fn decomposition_value(
        &self,
        oracle: &mut dyn MembershipOracle<Output = String>,
        prefix: &[char],
        access: &[char],
        suffix: &[char],
    ) -> Result<String, OracleError> {
        let mut value = self.output(prefix);
        value.push_str(&output_suffix(oracle, access, suffix)?);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use lightbulb_automata::prelude::*;

    use crate::active::{MealyLearner, MealyOracle, MembershipOracle, QueryCache};

    #[test_log::test]
    fn lstar_mealy() {
        let target = MealyMachine::builder()
            .with_transitions([
                (0, 'a', "0", 0),
                (0, 'b', "1", 1),
                (0, 'c', "2", 2),
                (1, 'a', "0", 2),
                (1, 'b', "1", 1),
                (1, 'c', "2", 2),
                (2, 'a', "2", 2),
                (2, 'b', "0", 0),
                (2, 'c', "1", 2),
            ])
            .into_mealy(0);

        let alphabet = target.alphabet().clone();
        let mut learner = MealyLearner::new(
            alphabet,
            QueryCache::new(MealyOracle::new(target.clone())),
            MealyOracle::new(target.clone()),
        );
        let learned = learner.learn().unwrap();
        assert_eq!(learned.size(), 3);
        assert!(learned.equivalent(&target));

        let mut oracle = MealyOracle::new(learned);
        assert_eq!(oracle.query(&['b', 'a', 'b']), Ok("100".to_string()));
    }

    #[test]
    fn delayed_difference() {
        // outputs differ only after reading "aa" first
        let target = MealyMachine::builder()
            .with_transitions([
                (0, 'a', "x", 1),
                (0, 'b', "x", 0),
                (1, 'a', "x", 2),
                (1, 'b', "x", 0),
                (2, 'a', "x", 2),
                (2, 'b', "y", 2),
            ])
            .into_mealy(0);
        let learned = MealyLearner::new(
            target.alphabet().clone(),
            MealyOracle::new(target.clone()),
            MealyOracle::new(target.clone()),
        )
        .learn()
        .unwrap();
        assert!(learned.equivalent(&target));
        assert_eq!(learned.size(), 3);
    }
}
