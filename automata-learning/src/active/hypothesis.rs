use lightbulb_automata::prelude::*;

/// The interface a hypothesis has to provide for answering equivalence queries and for
/// processing counterexamples. Hypotheses produced by the learners are complete, so running a
/// word over the alphabet always reaches a state.
pub trait Hypothesis {
    type Output: Color;

    fn alphabet(&self) -> &CharAlphabet;

    fn initial(&self) -> StateIndex;

    fn reached_index_from(&self, source: StateIndex, input: &[char]) -> StateIndex;

    fn reached_index(&self, input: &[char]) -> StateIndex {
        self.reached_index_from(self.initial(), input)
    }

    /// The output that the hypothesis produces on `input`.
    fn output(&self, input: &[char]) -> Self::Output;
}

impl Hypothesis for DFA {
    type Output = bool;

    fn alphabet(&self) -> &CharAlphabet {
        DFA::alphabet(self)
    }

    fn initial(&self) -> StateIndex {
        DFA::initial(self)
    }

    fn reached_index_from(&self, source: StateIndex, input: &[char]) -> StateIndex {
        self.reached_state_index_from(source, input)
            .expect("Hypothesis must be complete")
    }

    fn output(&self, input: &[char]) -> bool {
        self.accepts(input)
    }
}

impl Hypothesis for Sfa {
    type Output = bool;

    fn alphabet(&self) -> &CharAlphabet {
        Sfa::alphabet(self)
    }

    fn initial(&self) -> StateIndex {
        Sfa::initial(self)
    }

    fn reached_index_from(&self, source: StateIndex, input: &[char]) -> StateIndex {
        input
            .iter()
            .try_fold(source, |q, sym| self.successor(q, *sym))
            .expect("Hypothesis must be complete")
    }

    fn output(&self, input: &[char]) -> bool {
        self.accepts(input)
    }
}

impl Hypothesis for MealyMachine {
    type Output = String;

    fn alphabet(&self) -> &CharAlphabet {
        MealyMachine::alphabet(self)
    }

    fn initial(&self) -> StateIndex {
        MealyMachine::initial(self)
    }

    fn reached_index_from(&self, source: StateIndex, input: &[char]) -> StateIndex {
        self.run_from(source, input)
            .map(|(q, _)| q)
            .expect("Hypothesis must be complete")
    }

    fn output(&self, input: &[char]) -> String {
        self.transform(input).expect("Hypothesis must be complete")
    }
}
