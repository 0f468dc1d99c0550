use lightbulb_automata::prelude::*;
use tracing::trace;

use crate::{OracleError, Statistics};

use super::MembershipOracle;

/// Wraps a [`MembershipOracle`] and memoizes its answers. Every learner owns its own cache, so
/// the answers are kept for the lifetime of one learning run only.
#[derive(Debug, Clone)]
pub struct QueryCache<M: MembershipOracle> {
    oracle: M,
    cache: math::Map<Word, M::Output>,
    queries: usize,
    hits: usize,
}

impl<M: MembershipOracle> QueryCache<M> {
    pub fn new(oracle: M) -> Self {
        Self {
            oracle,
            cache: math::Map::default(),
            queries: 0,
            hits: 0,
        }
    }

    /// The number of queries that were forwarded to the wrapped oracle.
    pub fn queries(&self) -> usize {
        self.queries
    }

    /// The number of queries that were answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Returns the cached answer for `word` without querying.
    pub fn get(&self, word: &[char]) -> Option<&M::Output> {
        self.cache.get(word)
    }

    pub fn into_inner(self) -> M {
        self.oracle
    }
}

impl<M: MembershipOracle> MembershipOracle for QueryCache<M> {
    type Output = M::Output;

    fn query(&mut self, word: &[char]) -> Result<Self::Output, OracleError> {
        if let Some(output) = self.cache.get(word) {
            self.hits += 1;
            return Ok(output.clone());
        }
        self.queries += 1;
        let output = self.oracle.query(word)?;
        trace!("query {} gave {:?}", word.show(), output);
        self.cache.insert(word.to_vec(), output.clone());
        Ok(output)
    }

    fn verbose_query(&mut self, word: &[char]) -> Result<(String, String), OracleError> {
        self.queries += 1;
        self.oracle.verbose_query(word)
    }

    fn statistics(&self) -> Statistics {
        let mut stats = self.oracle.statistics();
        stats.push("membership queries", self.queries);
        stats.push("cache hits", self.hits);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active::FnOracle;

    #[test]
    fn cache_counts() {
        let mut calls = 0;
        let mut cache = QueryCache::new(FnOracle::new(|w: &[char]| {
            calls += 1;
            w.len() % 2 == 0
        }));
        assert_eq!(cache.query(&['a']), Ok(false));
        assert_eq!(cache.query(&['a']), Ok(false));
        assert_eq!(cache.query(&['a', 'b']), Ok(true));
        assert_eq!(cache.queries(), 2);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.get(&['a', 'b']), Some(&true));
        assert_eq!(cache.statistics().get("membership queries"), Some("2"));
        drop(cache);
        assert_eq!(calls, 2);
    }
}
