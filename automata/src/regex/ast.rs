use std::collections::BTreeSet;

use itertools::Itertools;

use crate::alphabet::CharAlphabet;

/// A regular expression over characters. Values should be built through the smart constructors
/// [`Regex::concat`], [`Regex::alt`] and [`Regex::star`], which keep expressions flat and remove
/// the obvious redundancies (neutral and absorbing elements, nested stars, duplicate
/// alternatives). Adjacent single character classes in an alternation are merged into one class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Regex {
    /// Matches nothing.
    Empty,
    /// Matches only the empty word.
    Epsilon,
    /// Matches a single symbol from the set, which is never empty.
    Class(BTreeSet<char>),
    /// Concatenation of at least two expressions.
    Concat(Vec<Regex>),
    /// Alternation of at least two expressions.
    Alt(Vec<Regex>),
    /// Kleene star.
    Star(Box<Regex>),
}

impl Regex {
    /// Matches precisely the given symbol.
    pub fn symbol(sym: char) -> Self {
        Regex::Class(BTreeSet::from([sym]))
    }

    /// Matches one of the given symbols, [`Regex::Empty`] if there are none.
    pub fn class<I: IntoIterator<Item = char>>(symbols: I) -> Self {
        let set: BTreeSet<_> = symbols.into_iter().collect();
        if set.is_empty() {
            Regex::Empty
        } else {
            Regex::Class(set)
        }
    }

    /// Returns true if the expression matches the empty word.
    pub fn is_nullable(&self) -> bool {
        match self {
            Regex::Empty | Regex::Class(_) => false,
            Regex::Epsilon | Regex::Star(_) => true,
            Regex::Concat(parts) => parts.iter().all(|r| r.is_nullable()),
            Regex::Alt(parts) => parts.iter().any(|r| r.is_nullable()),
        }
    }

    /// Concatenation of `self` and `other`.
    pub fn concat(self, other: Regex) -> Regex {
        match (self, other) {
            (Regex::Empty, _) | (_, Regex::Empty) => Regex::Empty,
            (Regex::Epsilon, r) | (r, Regex::Epsilon) => r,
            (Regex::Concat(mut left), Regex::Concat(right)) => {
                left.extend(right);
                Regex::Concat(left)
            }
            (Regex::Concat(mut left), r) => {
                left.push(r);
                Regex::Concat(left)
            }
            (l, Regex::Concat(mut right)) => {
                right.insert(0, l);
                Regex::Concat(right)
            }
            (l, r) => Regex::Concat(vec![l, r]),
        }
    }

    /// Alternation of `self` and `other`.
    pub fn alt(self, other: Regex) -> Regex {
        let mut parts: Vec<Regex> = vec![];
        for r in [self, other] {
            match r {
                Regex::Empty => {}
                Regex::Alt(inner) => parts.extend(inner),
                r => parts.push(r),
            }
        }

        // merge all single symbol classes into the first one
        let mut merged: Vec<Regex> = vec![];
        let mut class_position = None;
        for r in parts {
            match (r, class_position) {
                (Regex::Class(symbols), Some(pos)) => {
                    if let Regex::Class(existing) = &mut merged[pos] {
                        existing.extend(symbols);
                    }
                }
                (Regex::Class(symbols), None) => {
                    class_position = Some(merged.len());
                    merged.push(Regex::Class(symbols));
                }
                (r, _) => {
                    if !merged.contains(&r) {
                        merged.push(r);
                    }
                }
            }
        }

        // ε is redundant next to anything nullable
        if merged.contains(&Regex::Epsilon)
            && merged
                .iter()
                .any(|r| r != &Regex::Epsilon && r.is_nullable())
        {
            merged.retain(|r| r != &Regex::Epsilon);
        }

        match merged.len() {
            0 => Regex::Empty,
            1 => merged.pop().unwrap_or(Regex::Empty),
            _ => Regex::Alt(merged),
        }
    }

    /// Kleene star of `self`.
    pub fn star(self) -> Regex {
        match self {
            Regex::Empty | Regex::Epsilon => Regex::Epsilon,
            Regex::Star(inner) => Regex::Star(inner),
            Regex::Alt(parts) if parts.contains(&Regex::Epsilon) => {
                let inner = parts
                    .into_iter()
                    .filter(|r| r != &Regex::Epsilon)
                    .fold(Regex::Empty, Regex::alt);
                inner.star()
            }
            r => Regex::Star(Box::new(r)),
        }
    }

    /// Renders the expression in the syntax understood by [`Regex::compile`]. Symbol sets are
    /// written as `x` for a single symbol, `.` for the whole alphabet, `[^xyz]` if the complement
    /// relative to `alphabet` is smaller than the set and `[abc]` otherwise.
    pub fn render(&self, alphabet: &CharAlphabet) -> String {
        match self {
            Regex::Empty => "[^\\x00-\\x{10FFFF}]".to_string(),
            Regex::Epsilon => "()".to_string(),
            Regex::Class(symbols) => render_class(symbols, Some(alphabet)),
            Regex::Concat(parts) => parts
                .iter()
                .map(|r| match r {
                    Regex::Alt(_) => format!("({})", r.render(alphabet)),
                    r => r.render(alphabet),
                })
                .join(""),
            Regex::Alt(parts) => parts.iter().map(|r| r.render(alphabet)).join("|"),
            Regex::Star(inner) => match inner.as_ref() {
                Regex::Class(_) => format!("{}*", inner.render(alphabet)),
                r => format!("({})*", r.render(alphabet)),
            },
        }
    }
}

fn escape(sym: char) -> String {
    if regex_syntax::is_meta_character(sym) {
        format!("\\{sym}")
    } else if sym.is_control() || (sym.is_whitespace() && sym != ' ') {
        format!("\\x{{{:X}}}", sym as u32)
    } else {
        sym.to_string()
    }
}

fn render_class(symbols: &BTreeSet<char>, alphabet: Option<&CharAlphabet>) -> String {
    if symbols.len() == 1 {
        return symbols.iter().map(|sym| escape(*sym)).join("");
    }
    if let Some(alphabet) = alphabet {
        let complement: Vec<char> = alphabet
            .universe()
            .filter(|sym| !symbols.contains(sym))
            .collect();
        if complement.is_empty() && alphabet.universe().all(|sym| symbols.contains(&sym)) {
            return ".".to_string();
        }
        if complement.len() < symbols.len() {
            return format!("[^{}]", complement.into_iter().map(escape).join(""));
        }
    }
    format!("[{}]", symbols.iter().map(|sym| escape(*sym)).join(""))
}

impl std::fmt::Display for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Regex::Class(symbols) => write!(f, "{}", render_class(symbols, None)),
            Regex::Concat(parts) => {
                for r in parts {
                    match r {
                        Regex::Alt(_) => write!(f, "({r})")?,
                        r => write!(f, "{r}")?,
                    }
                }
                Ok(())
            }
            Regex::Alt(parts) => write!(f, "{}", parts.iter().join("|")),
            Regex::Star(inner) => match inner.as_ref() {
                Regex::Class(_) => write!(f, "{inner}*"),
                r => write!(f, "({r})*"),
            },
            Regex::Empty => write!(f, "[^\\x00-\\x{{10FFFF}}]"),
            Regex::Epsilon => write!(f, "()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Regex;
    use crate::alphabet::CharAlphabet;

    #[test]
    fn smart_constructors() {
        let a = Regex::symbol('a');
        let b = Regex::symbol('b');
        assert_eq!(a.clone().concat(Regex::Epsilon), a);
        assert_eq!(a.clone().concat(Regex::Empty), Regex::Empty);
        assert_eq!(a.clone().alt(b.clone()), Regex::class(['a', 'b']));
        assert_eq!(a.clone().star().star(), a.clone().star());
        assert_eq!(Regex::Epsilon.alt(a.clone()).star(), a.clone().star());
        assert_eq!(Regex::Epsilon.alt(a.clone().star()), a.clone().star());
        assert_eq!(a.clone().alt(a.clone()), a);
    }

    #[test]
    fn rendering() {
        let alphabet = CharAlphabet::from("abcd");
        let abc = Regex::class(['a', 'b', 'c']);
        assert_eq!(abc.render(&alphabet), "[^d]");
        assert_eq!(Regex::class(['a', 'b']).render(&alphabet), "[ab]");
        assert_eq!(Regex::class("abcd".chars()).render(&alphabet), ".");
        assert_eq!(Regex::symbol('.').render(&alphabet), "\\.");

        let r = Regex::symbol('a')
            .concat(Regex::symbol('b').alt(Regex::symbol('c').concat(Regex::symbol('d'))))
            .concat(Regex::class(['a', 'b']).star());
        assert_eq!(r.render(&alphabet), "a(b|cd)[ab]*");
        assert_eq!(r.to_string(), "a(b|cd)[ab]*");
    }
}
