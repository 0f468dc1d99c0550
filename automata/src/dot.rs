use std::fmt::Display;

use itertools::Itertools;
use thiserror::Error;

use crate::{
    automaton::{MealyMachine, Sfa, StateIndex, DFA},
    Show,
};

/// Errors that occur when rendering through the `dot` executable.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Spawning `dot` or exchanging data with it failed.
    #[error("could not run dot: \"{0}\"")]
    Io(#[from] std::io::Error),
    /// `dot` exited unsuccessfully.
    #[error("Child process had non-zero exit status \"{0}\"")]
    NonZeroExit(std::process::ExitStatus),
}

/// Attributes that can be attached to a node in the DOT output.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotStateAttribute {
    /// The label of a node
    Label(String),
    /// The shape of a node
    Shape(String),
}

impl Display for DotStateAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotStateAttribute::Label(s) => write!(f, "label=\"{}\"", escape_label(s)),
            DotStateAttribute::Shape(s) => write!(f, "shape=\"{s}\""),
        }
    }
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Implemented by automata that can be written in the graphviz DOT format.
pub trait Dottable {
    /// The name of the digraph.
    fn dot_name(&self) -> String;

    /// The number of states, states are identified by their index.
    fn dot_states(&self) -> usize;

    /// The initial state, it receives an incoming arrow from an invisible node.
    fn dot_initial(&self) -> StateIndex;

    /// Attributes of the node for `state`.
    fn dot_state_attributes(&self, state: StateIndex) -> Vec<DotStateAttribute> {
        vec![DotStateAttribute::Label(state.show())]
    }

    /// All edges as `(source, target, label)`.
    fn dot_edges(&self) -> Vec<(StateIndex, StateIndex, String)>;

    /// Compute the graphviz representation, for more information on the DOT format,
    /// see the [graphviz documentation](https://graphviz.org/doc/info/lang.html).
    fn dot_representation(&self) -> String {
        let header = [
            format!("digraph {} {{", self.dot_name()),
            "init [label=\"\", shape=none]".to_string(),
            format!("init -> q{}", self.dot_initial()),
        ];
        let states = (0..self.dot_states()).map(|q| {
            format!(
                "q{q} [{}]",
                self.dot_state_attributes(q)
                    .into_iter()
                    .map(|attr| attr.to_string())
                    .join(", ")
            )
        });
        let edges = self.dot_edges().into_iter().map(|(q, p, label)| {
            format!("q{q} -> q{p} [label=\"{}\"]", escape_label(&label))
        });
        header
            .into_iter()
            .chain(states)
            .chain(edges)
            .chain(std::iter::once("}".to_string()))
            .join("\n")
    }

    /// Renders the object visually (as PNG) and returns a vec of bytes/u8s encoding
    /// the rendered image. This method is only available on the `graphviz` crate feature
    /// and requires the `dot` executable.
    #[cfg(feature = "graphviz")]
    fn render_graphviz(&self) -> Result<Vec<u8>, RenderError> {
        use std::io::{Read, Write};
        let dot = self.dot_representation();
        tracing::trace!("writing dot representation\n{}", dot);
        let mut child = std::process::Command::new("dot")
            .arg("-Tpng")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(dot.as_bytes())?;
        }
        let mut output = Vec::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_end(&mut output)?;
        }
        let status = child.wait()?;
        if !status.success() {
            return Err(RenderError::NonZeroExit(status));
        }
        Ok(output)
    }

    /// Attempts to render the object to a PNG file with the given filename. This method
    /// is only available on the `graphviz` crate feature and makes use of temporary files.
    #[cfg(feature = "graphviz")]
    fn render_to_file_name(&self, filename: &str) -> Result<(), RenderError> {
        use std::io::Write;
        tracing::trace!("Outputting dot and rendering to png");
        let mut tempfile = tempfile::NamedTempFile::new()?;
        tempfile.write_all(self.dot_representation().as_bytes())?;
        let status = std::process::Command::new("dot")
            .arg("-Tpng")
            .arg("-o")
            .arg(filename)
            .arg(tempfile.path())
            .status()?;
        if !status.success() {
            return Err(RenderError::NonZeroExit(status));
        }
        Ok(())
    }
}

fn acceptance_shape(accepting: bool) -> DotStateAttribute {
    DotStateAttribute::Shape(if accepting { "doublecircle" } else { "circle" }.to_string())
}

impl Dottable for DFA {
    fn dot_name(&self) -> String {
        "DFA".into()
    }

    fn dot_states(&self) -> usize {
        self.size()
    }

    fn dot_initial(&self) -> StateIndex {
        self.initial()
    }

    fn dot_state_attributes(&self, state: StateIndex) -> Vec<DotStateAttribute> {
        vec![
            DotStateAttribute::Label(state.show()),
            acceptance_shape(self.is_accepting(state)),
        ]
    }

    fn dot_edges(&self) -> Vec<(StateIndex, StateIndex, String)> {
        self.state_indices()
            .flat_map(|q| {
                self.edges_from(q)
                    .into_group_map_by(|(_, p)| *p)
                    .into_iter()
                    .sorted()
                    .map(move |(p, syms)| (q, p, syms.into_iter().map(|(a, _)| a.show()).join(",")))
            })
            .collect()
    }
}

impl Dottable for Sfa {
    fn dot_name(&self) -> String {
        "SFA".into()
    }

    fn dot_states(&self) -> usize {
        self.size()
    }

    fn dot_initial(&self) -> StateIndex {
        self.initial()
    }

    fn dot_state_attributes(&self, state: StateIndex) -> Vec<DotStateAttribute> {
        vec![
            DotStateAttribute::Label(state.show()),
            acceptance_shape(self.is_accepting(state)),
        ]
    }

    fn dot_edges(&self) -> Vec<(StateIndex, StateIndex, String)> {
        (0..self.size())
            .flat_map(|q| {
                self.edges_from(q).iter().map(move |e| {
                    let label = if e.sink {
                        format!("{} (sink)", e.predicate.show())
                    } else {
                        e.predicate.show()
                    };
                    (q, e.target, label)
                })
            })
            .collect()
    }
}

impl Dottable for MealyMachine {
    fn dot_name(&self) -> String {
        "Mealy".into()
    }

    fn dot_states(&self) -> usize {
        self.size()
    }

    fn dot_initial(&self) -> StateIndex {
        self.initial()
    }

    fn dot_edges(&self) -> Vec<(StateIndex, StateIndex, String)> {
        (0..self.size())
            .flat_map(|q| {
                self.alphabet().universe().filter_map(move |a| {
                    self.transition(q, a)
                        .map(|(p, out)| (q, p, format!("{}/{}", a.show(), out.show())))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn dot_output() {
        let dfa = crate::tests::contains_ab();
        let dot = dfa.dot_representation();
        assert!(dot.starts_with("digraph DFA {"));
        assert!(dot.contains("q2 [label=\"2\", shape=\"doublecircle\"]"));
        assert!(dot.contains("q2 -> q2 [label=\"a,b\"]"));
        assert!(dot.ends_with('}'));

        let sfa = Sfa::from_dfa(&dfa);
        assert!(sfa.dot_representation().contains("(sink)"));

        let mm = MealyMachine::builder()
            .with_transitions([(0, 'a', "x", 0)])
            .into_mealy(0);
        assert!(mm
            .dot_representation()
            .contains("q0 -> q0 [label=\"a/\\\"x\\\"\"]"));
    }
}
