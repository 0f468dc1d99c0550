/// Iterator over all words over a list of symbols in length-lexicographic order, i.e. first the
/// empty word, then all words of length one in the order of the symbols and so on.
#[derive(Debug, Clone)]
pub struct KleeneStar {
    symbols: Vec<char>,
    current: Vec<usize>,
    max_length: Option<usize>,
}

impl Iterator for KleeneStar {
    type Item = Vec<char>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.max_length.is_some_and(|max| self.current.len() > max) {
            return None;
        }
        let out = self.current.iter().map(|i| self.symbols[*i]).collect();

        if self.symbols.is_empty() {
            // only the empty word exists
            self.max_length = Some(0);
            self.current = vec![0];
            return Some(out);
        }

        let mut carry = true;
        let mut i = self.current.len();
        while carry && i > 0 {
            i -= 1;
            self.current[i] += 1;
            if self.current[i] >= self.symbols.len() {
                self.current[i] = 0;
                carry = true;
            } else {
                carry = false;
            }
        }

        if carry {
            self.current = vec![0; self.current.len() + 1];
        }

        Some(out)
    }
}

impl KleeneStar {
    /// Enumerates all words, starting with the empty word.
    pub fn new<I: IntoIterator<Item = char>>(symbols: I) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
            current: vec![],
            max_length: None,
        }
    }

    /// Enumerates all words of length at most `max_length`, the iterator is finite.
    pub fn bounded<I: IntoIterator<Item = char>>(symbols: I, max_length: usize) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::new(symbols)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::KleeneStar;

    #[test]
    fn kleene_star() {
        assert_eq!(
            KleeneStar::new(['a', 'b'])
                .take_while(|e| e.len() <= 2)
                .collect::<Vec<_>>(),
            vec![
                vec![],
                vec!['a'],
                vec!['b'],
                vec!['a', 'a'],
                vec!['a', 'b'],
                vec!['b', 'a'],
                vec!['b', 'b']
            ]
        );
        assert_eq!(KleeneStar::bounded(['a', 'b', 'c'], 2).count(), 13);
        assert_eq!(KleeneStar::bounded([], 3).count(), 1);
    }
}
