use std::fmt::Display;

use itertools::Itertools;

use crate::Show;

/// A symbol is a single character of the input of an automaton.
pub type Symbol = char;

/// A finite word is a sequence of symbols.
pub type Word = Vec<Symbol>;

/// Represents an ordered alphabet where a [`Symbol`] is just a single `char`. The order of the
/// symbols determines the order in which learners and searches explore transitions, which in
/// turn makes the length-lexicographically minimal access words well defined.
///
/// # Example
/// ```
/// use lightbulb_automata::prelude::*;
///
/// let alphabet = CharAlphabet::from_iter(['b', 'a', 'b']);
/// assert_eq!(alphabet.size(), 2);
/// assert_eq!(alphabet.universe().collect::<String>(), "ab");
/// ```
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord, Default)]
pub struct CharAlphabet(Vec<char>);

impl CharAlphabet {
    /// Creates a new [`CharAlphabet`] from the given symbols, keeping the order in which they are
    /// given but dropping duplicates.
    pub fn new<I: IntoIterator<Item = char>>(symbols: I) -> Self {
        Self(symbols.into_iter().unique().collect())
    }

    /// Creates a new [`CharAlphabet`] alphabet of the given size. The symbols are just the first `size` letters
    /// of the alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Self {
        assert!(size <= 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// The printable ASCII characters, i.e. everything from the space `' '` up to `'~'`.
    pub fn printable_ascii() -> Self {
        Self((0x20u8..0x7f).map(char::from).collect())
    }

    /// All 256 byte values, interpreted as the characters `U+0000` to `U+00FF`.
    pub fn bytes() -> Self {
        Self((0u8..=255).map(char::from).collect())
    }

    /// Returns the number of symbols.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the alphabet has no symbols at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all symbols in order.
    pub fn universe(&self) -> impl DoubleEndedIterator<Item = char> + ExactSizeIterator + '_ {
        self.0.iter().copied()
    }

    /// Gives the symbols as a slice.
    pub fn symbols(&self) -> &[char] {
        &self.0
    }

    /// Checks whether `symbol` is part of the alphabet.
    pub fn contains(&self, symbol: char) -> bool {
        self.0.contains(&symbol)
    }

    /// Returns the first symbol of `word` that is not part of the alphabet, if any.
    pub fn foreign_symbol(&self, word: &[char]) -> Option<char> {
        word.iter().find(|sym| !self.contains(**sym)).copied()
    }

    /// Gives the position of `symbol` in the alphabet.
    pub fn position(&self, symbol: char) -> Option<usize> {
        self.0.iter().position(|x| symbol.eq(x))
    }

    /// Returns the symbol at position `pos`.
    pub fn nth(&self, pos: usize) -> Option<char> {
        self.0.get(pos).copied()
    }

    /// Returns the first symbol of the alphabet, if it is not empty.
    pub fn first(&self) -> Option<char> {
        self.0.first().copied()
    }

    /// Computes the union of `self` and `other`. The symbols of `self` come first, followed by
    /// those symbols of `other` which are not already present.
    pub fn union(&self, other: &CharAlphabet) -> CharAlphabet {
        if self == other {
            return self.clone();
        }
        Self::new(self.universe().chain(other.universe()))
    }
}

impl std::ops::Index<usize> for CharAlphabet {
    type Output = char;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<char>> for CharAlphabet {
    fn from(value: Vec<char>) -> Self {
        Self::new(value)
    }
}

impl From<&str> for CharAlphabet {
    fn from(value: &str) -> Self {
        Self::new(value.chars())
    }
}

impl FromIterator<char> for CharAlphabet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

impl Display for CharAlphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.universe().map(|sym| sym.show()).join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::CharAlphabet;

    #[test]
    fn alphabet_order() {
        let alphabet = CharAlphabet::new(['c', 'a', 'c', 'b']);
        assert_eq!(alphabet.symbols(), &['c', 'a', 'b']);
        assert_eq!(alphabet.position('b'), Some(2));
        assert_eq!(alphabet.foreign_symbol(&['a', 'x']), Some('x'));

        let sorted: CharAlphabet = ['c', 'a', 'c', 'b'].into_iter().collect();
        assert_eq!(sorted.symbols(), &['a', 'b', 'c']);
        assert_eq!(
            sorted.union(&CharAlphabet::from("xa")).symbols(),
            &['a', 'b', 'c', 'x']
        );
        assert_eq!(CharAlphabet::bytes().size(), 256);
        assert_eq!(CharAlphabet::printable_ascii().first(), Some(' '));
    }
}
