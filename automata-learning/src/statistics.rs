use std::fmt::Display;

use itertools::Itertools;

/// An ordered list of named counters, e.g. the number of membership queries a learner posed.
/// Names are unique, pushing a name twice overwrites the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics(Vec<(String, String)>);

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under `name`.
    pub fn push<N: Into<String>, V: ToString>(&mut self, name: N, value: V) {
        let name = name.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Builder style variant of [`Self::push`].
    pub fn with<N: Into<String>, V: ToString>(mut self, name: N, value: V) -> Self {
        self.push(name, value);
        self
    }

    /// Appends all entries of `other`.
    pub fn extend(&mut self, other: Statistics) {
        for (name, value) in other.0 {
            self.push(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The entries in the order in which they were first recorded.
    pub fn entries(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.0.iter().map(|(n, v)| format!("{n}: {v}")).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Statistics;

    #[test]
    fn statistics_keep_order() {
        let mut stats = Statistics::new().with("queries", 3).with("hits", 1);
        stats.push("queries", 4);
        assert_eq!(stats.get("queries"), Some("4"));
        assert_eq!(
            stats.entries(),
            &[
                ("queries".to_string(), "4".to_string()),
                ("hits".to_string(), "1".to_string())
            ]
        );
        assert_eq!(stats.to_string(), "queries: 4, hits: 1");
    }
}
