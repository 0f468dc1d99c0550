use lightbulb_automata::{kleene::KleeneStar, prelude::*};
use tracing::trace;

use crate::{OracleError, Statistics};

use super::Hypothesis;

/// The answer to an equivalence query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Equivalence {
    /// The hypothesis is correct.
    Correct,
    /// A word on which the hypothesis and the target disagree.
    Counterexample(Word),
    /// The learner should stop without a result, used by the differential session once a
    /// difference between two targets has been confirmed.
    Halt,
}

/// A membership oracle answers queries for single words. Implementations may perform real I/O,
/// a failure is reported as an [`OracleError`] and aborts the learner.
///
/// The trait is generic over the `Output` of a query, which is `bool` for learning a regular
/// language and the produced output `String` for learning a Mealy machine.
pub trait MembershipOracle {
    /// The type of answers.
    type Output: Color;

    /// Asks the target for its answer on `word`.
    fn query(&mut self, word: &[char]) -> Result<Self::Output, OracleError>;

    /// Like [`Self::query`], but returns the raw request and response, e.g. for auditing what
    /// was sent to a target.
    fn verbose_query(&mut self, word: &[char]) -> Result<(String, String), OracleError> {
        let output = self.query(word)?;
        Ok((word.show(), format!("{output:?}")))
    }

    /// Counters describing the work done so far.
    fn statistics(&self) -> Statistics {
        Statistics::default()
    }
}

impl<M: MembershipOracle + ?Sized> MembershipOracle for &mut M {
    type Output = M::Output;

    fn query(&mut self, word: &[char]) -> Result<Self::Output, OracleError> {
        M::query(self, word)
    }

    fn verbose_query(&mut self, word: &[char]) -> Result<(String, String), OracleError> {
        M::verbose_query(self, word)
    }

    fn statistics(&self) -> Statistics {
        M::statistics(self)
    }
}

impl<M: MembershipOracle + ?Sized> MembershipOracle for Box<M> {
    type Output = M::Output;

    fn query(&mut self, word: &[char]) -> Result<Self::Output, OracleError> {
        M::query(self, word)
    }

    fn verbose_query(&mut self, word: &[char]) -> Result<(String, String), OracleError> {
        M::verbose_query(self, word)
    }

    fn statistics(&self) -> Statistics {
        M::statistics(self)
    }
}

/// An equivalence oracle decides whether a hypothesis is correct. It receives the membership
/// oracle of the learner so that black-box strategies such as sampling can pose queries through
/// the learner's cache.
pub trait EquivalenceOracle<H: Hypothesis> {
    /// Checks `hypothesis` and returns a counterexample if it is wrong.
    fn check(
        &mut self,
        hypothesis: &H,
        oracle: &mut dyn MembershipOracle<Output = H::Output>,
    ) -> Result<Equivalence, OracleError>;
}

impl<H: Hypothesis, E: EquivalenceOracle<H> + ?Sized> EquivalenceOracle<H> for &mut E {
    fn check(
        &mut self,
        hypothesis: &H,
        oracle: &mut dyn MembershipOracle<Output = H::Output>,
    ) -> Result<Equivalence, OracleError> {
        E::check(self, hypothesis, oracle)
    }
}

impl<H: Hypothesis, E: EquivalenceOracle<H> + ?Sized> EquivalenceOracle<H> for Box<E> {
    fn check(
        &mut self,
        hypothesis: &H,
        oracle: &mut dyn MembershipOracle<Output = H::Output>,
    ) -> Result<Equivalence, OracleError> {
        E::check(self, hypothesis, oracle)
    }
}

/// Adapts a closure into a [`MembershipOracle`] that never fails.
pub struct FnOracle<F>(F);

impl<F> FnOracle<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<X: Color, F: FnMut(&[char]) -> X> MembershipOracle for FnOracle<F> {
    type Output = X;

    fn query(&mut self, word: &[char]) -> Result<X, OracleError> {
        Ok((self.0)(word))
    }
}

/// An oracle based on a [`DFA`]. It answers membership queries by running the word through the
/// automaton, equivalence queries are answered with the shortest word in the symmetric difference
/// of the automaton and the hypothesis.
#[derive(Debug, Clone)]
pub struct DfaOracle {
    automaton: DFA,
}

impl DfaOracle {
    pub fn new(automaton: DFA) -> Self {
        Self { automaton }
    }

    pub fn automaton(&self) -> &DFA {
        &self.automaton
    }
}

impl MembershipOracle for DfaOracle {
    type Output = bool;

    fn query(&mut self, word: &[char]) -> Result<bool, OracleError> {
        Ok(self.automaton.accepts(word))
    }
}

impl<H: Hypothesis<Output = bool> + Acceptor> EquivalenceOracle<H> for DfaOracle {
    fn check(
        &mut self,
        hypothesis: &H,
        _oracle: &mut dyn MembershipOracle<Output = H::Output>,
    ) -> Result<Equivalence, OracleError> {
        let witness = self
            .automaton
            .symmetric_difference(&hypothesis.to_dfa())
            .shortest_string();
        trace!("equivalence check against reference DFA gave {:?}", witness);
        Ok(witness.map_or(Equivalence::Correct, Equivalence::Counterexample))
    }
}

/// An oracle based on a [`MealyMachine`], the output on a word is the concatenation of the
/// outputs along its run.
#[derive(Debug, Clone)]
pub struct MealyOracle {
    automaton: MealyMachine,
}

impl MealyOracle {
    pub fn new(automaton: MealyMachine) -> Self {
        Self { automaton }
    }
}

impl MembershipOracle for MealyOracle {
    type Output = String;

    fn query(&mut self, word: &[char]) -> Result<String, OracleError> {
        self.automaton
            .transform(word)
            .ok_or_else(|| OracleError::Target(format!("no output defined for {}", word.show())))
    }
}

impl EquivalenceOracle<MealyMachine> for MealyOracle {
    fn check(
        &mut self,
        hypothesis: &MealyMachine,
        _oracle: &mut dyn MembershipOracle<Output = String>,
    ) -> Result<Equivalence, OracleError> {
        Ok(self
            .automaton
            .find_difference(hypothesis)
            .map_or(Equivalence::Correct, Equivalence::Counterexample))
    }
}

/// Compares the hypothesis with the membership oracle on a number of random words. This works for
/// black-box targets, but it can only find counterexamples up to the given length.
#[cfg(feature = "random")]
#[derive(Debug, Clone)]
pub struct SamplingOracle {
    samples: usize,
    max_length: usize,
}

#[cfg(feature = "random")]
impl SamplingOracle {
    /// Draws `samples` words with a length of at most `max_length` per equivalence query.
    pub fn new(samples: usize, max_length: usize) -> Self {
        Self {
            samples,
            max_length,
        }
    }
}

#[cfg(feature = "random")]
impl<H: Hypothesis> EquivalenceOracle<H> for SamplingOracle {
    fn check(
        &mut self,
        hypothesis: &H,
        oracle: &mut dyn MembershipOracle<Output = H::Output>,
    ) -> Result<Equivalence, OracleError> {
        for _ in 0..self.samples {
            let word = lightbulb_automata::random::generate_random_word(
                hypothesis.alphabet(),
                0,
                self.max_length,
            );
            if oracle.query(&word)? != hypothesis.output(&word) {
                return Ok(Equivalence::Counterexample(word));
            }
        }
        Ok(Equivalence::Correct)
    }
}

/// Compares the hypothesis with the membership oracle on all words up to a given length, in
/// length-lexicographic order. The first counterexample found is therefore a shortest one.
#[derive(Debug, Clone)]
pub struct ExhaustiveOracle {
    max_length: usize,
}

impl ExhaustiveOracle {
    /// Checks all words with a length of at most `max_length`.
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl<H: Hypothesis> EquivalenceOracle<H> for ExhaustiveOracle {
    fn check(
        &mut self,
        hypothesis: &H,
        oracle: &mut dyn MembershipOracle<Output = H::Output>,
    ) -> Result<Equivalence, OracleError> {
        for word in KleeneStar::bounded(hypothesis.alphabet().universe(), self.max_length) {
            if oracle.query(&word)? != hypothesis.output(&word) {
                return Ok(Equivalence::Counterexample(word));
            }
        }
        Ok(Equivalence::Correct)
    }
}

#[cfg(test)]
mod tests {
    use lightbulb_automata::prelude::*;

    use super::*;

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

    #[test]
    fn dfa_oracle() {
        let mut oracle = DfaOracle::new(contains_ab());
        assert_eq!(oracle.query(&['a', 'b']), Ok(true));
        assert_eq!(oracle.query(&['b', 'a']), Ok(false));
        assert_eq!(
            oracle.verbose_query(&['a', 'b']),
            Ok(("\"ab\"".to_string(), "true".to_string()))
        );

        let mut mq = FnOracle::new(|_: &[char]| false);
        let wrong = DFA::empty(CharAlphabet::from("ab"));
        assert_eq!(
            oracle.check(&wrong, &mut mq),
            Ok(Equivalence::Counterexample(vec!['a', 'b']))
        );
        assert_eq!(oracle.check(&contains_ab(), &mut mq), Ok(Equivalence::Correct));
    }

    #[test]
    fn exhaustive_oracle() {
        let mut mq = DfaOracle::new(contains_ab());
        let wrong = DFA::universal(CharAlphabet::from("ab"));
        assert_eq!(
            ExhaustiveOracle::new(3).check(&wrong, &mut mq),
            Ok(Equivalence::Counterexample(vec![]))
        );
        assert_eq!(
            ExhaustiveOracle::new(4).check(&contains_ab(), &mut mq),
            Ok(Equivalence::Correct)
        );
    }

    #[cfg(feature = "random")]
    #[test]
    fn sampling_oracle() {
        fastrand::seed(3);
        let mut mq = DfaOracle::new(contains_ab());
        let wrong = DFA::empty(CharAlphabet::from("ab"));
        match SamplingOracle::new(200, 6).check(&wrong, &mut mq) {
            Ok(Equivalence::Counterexample(word)) => assert!(contains_ab().accepts(&word)),
            other => panic!("expected a counterexample, got {other:?}"),
        }
    }
}
