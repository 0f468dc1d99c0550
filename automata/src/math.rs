use std::{collections::BTreeSet, hash::Hash};

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;

/// A partition is a different view on a congruence relation, by grouping elements of
/// type `I` into their respective classes under the relation. The classes are stored in an
/// arena and are addressed by their position in it.
#[derive(Debug, Clone)]
pub struct Partition<I: Hash + Eq>(Vec<BTreeSet<I>>);

impl<I: Hash + Eq> std::ops::Deref for Partition<I> {
    type Target = Vec<BTreeSet<I>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a, I: Hash + Eq> IntoIterator for &'a Partition<I> {
    type Item = &'a BTreeSet<I>;
    type IntoIter = std::slice::Iter<'a, BTreeSet<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<I: Hash + Eq> PartialEq for Partition<I> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|o| other.contains(o))
    }
}
impl<I: Hash + Eq> Eq for Partition<I> {}

impl<I: Hash + Eq + Ord + Copy> Partition<I> {
    /// Returns the size of the partition, i.e. the number of classes.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Builds a new partition from an iterator that yields iterators
    /// which yield elements of type `I`. Empty classes are dropped.
    pub fn new<X: IntoIterator<Item = I>, Y: IntoIterator<Item = X>>(iter: Y) -> Self {
        Self(
            iter.into_iter()
                .map(|it| it.into_iter().collect::<BTreeSet<_>>())
                .filter(|class| !class.is_empty())
                .collect(),
        )
    }

    /// Returns the position of the class that contains `element`, if any.
    pub fn class_of(&self, element: I) -> Option<usize> {
        self.0.iter().position(|class| class.contains(&element))
    }

    /// Computes a lookup table that maps every element (interpreted as an index) to the
    /// position of its class. Elements that do not appear in any class are mapped to `None`.
    pub fn lookup(&self, universe: usize) -> Vec<Option<usize>>
    where
        I: Into<usize>,
    {
        let mut out = vec![None; universe];
        for (position, class) in self.0.iter().enumerate() {
            for element in class {
                let idx: usize = (*element).into();
                if idx < universe {
                    out[idx] = Some(position);
                }
            }
        }
        out
    }
}

impl<I: Hash + Eq + Ord> From<Vec<BTreeSet<I>>> for Partition<I> {
    fn from(value: Vec<BTreeSet<I>>) -> Self {
        Self(value)
    }
}

/// Computes the length of the longest common prefix of `left` and `right`, counted in `char`s.
pub fn longest_common_prefix(left: &str, right: &str) -> usize {
    left.chars()
        .zip(right.chars())
        .take_while(|(l, r)| l == r)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_lookup() {
        let partition = Partition::new([vec![0usize, 2], vec![1], vec![]]);
        assert_eq!(partition.size(), 2);
        assert_eq!(partition.class_of(2), Some(0));
        assert_eq!(partition.lookup(4), vec![Some(0), Some(1), Some(0), None]);
        assert_eq!(partition, Partition::new([vec![1usize], vec![2, 0]]));
    }

    #[test]
    fn common_prefix() {
        assert_eq!(longest_common_prefix("abc", "abd"), 2);
        assert_eq!(longest_common_prefix("", "abd"), 0);
        assert_eq!(longest_common_prefix("äb", "äbc"), 2);
    }
}
