use lightbulb_automata::prelude::*;
use tracing::trace;

/// The result of a closedness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Closedness {
    Closed,
    /// The given extension row differs from every access row.
    NotClosed(Word),
}

/// An observation table in the sense of Angluin. Rows are words that are partitioned into access
/// rows (the set `S`, which always contains the empty word) and extension rows (one symbol
/// extensions of access rows, `S·Σ` without `S`). Columns are experiments, i.e. distinguishing
/// suffixes. The entry for row `u` and column `e` is some value derived from the answer to the
/// membership query `u·e`, every entry is computed at most once.
///
/// The table is generic over the entry type, for learning regular languages it is `bool`, the
/// Mealy learner stores output suffixes.
#[derive(Clone)]
pub struct ObservationTable<X> {
    access: Vec<Word>,
    extensions: Vec<Word>,
    experiments: Vec<Word>,
    entries: math::Map<Word, Vec<Option<X>>>,
    equiv_classes: math::Map<Word, Word>,
}

impl<X: Color> Default for ObservationTable<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: Color> ObservationTable<X> {
    /// Creates a table with the empty word as only (access) row and without any experiments.
    pub fn new() -> Self {
        Self {
            access: vec![vec![]],
            extensions: vec![],
            experiments: vec![],
            entries: math::Map::default(),
            equiv_classes: math::Map::default(),
        }
    }

    pub fn with_experiments<I: IntoIterator<Item = Word>>(experiments: I) -> Self {
        let mut table = Self::new();
        for experiment in experiments {
            table.add_experiment(experiment);
        }
        table
    }

    /// The access rows in the order in which they were added, the empty word comes first.
    pub fn access_rows(&self) -> &[Word] {
        &self.access
    }

    pub fn extension_rows(&self) -> &[Word] {
        &self.extensions
    }

    /// Iterates over all rows, access rows first.
    pub fn rows(&self) -> impl Iterator<Item = &Word> + '_ {
        self.access.iter().chain(self.extensions.iter())
    }

    pub fn experiments(&self) -> &[Word] {
        &self.experiments
    }

    pub fn experiment_index(&self, experiment: &[char]) -> Option<usize> {
        self.experiments.iter().position(|e| e == experiment)
    }

    pub fn is_access_row(&self, row: &[char]) -> bool {
        self.access.iter().any(|r| r == row)
    }

    pub fn contains_row(&self, row: &[char]) -> bool {
        self.rows().any(|r| r == row)
    }

    /// Adds `row` to `S` unless it is present already. An extension row with the same word is
    /// promoted instead.
    pub fn add_access_row(&mut self, row: Word) -> bool {
        if self.is_access_row(&row) {
            return false;
        }
        self.extensions.retain(|r| r != &row);
        self.access.push(row);
        true
    }

    /// Adds `row` to `S·Σ` unless the table knows the word already.
    pub fn add_extension_row(&mut self, row: Word) -> bool {
        if self.contains_row(&row) {
            return false;
        }
        self.extensions.push(row);
        true
    }

    /// Adds a column, returns false if it exists already.
    pub fn add_experiment(&mut self, experiment: Word) -> bool {
        if self.experiment_index(&experiment).is_some() {
            return false;
        }
        trace!("adding experiment {}", experiment.show());
        self.experiments.push(experiment);
        true
    }

    /// Moves `row` from the extension rows into `S`.
    pub fn promote(&mut self, row: &[char]) {
        let Some(pos) = self.extensions.iter().position(|r| r == row) else {
            panic!("{} is not an extension row", row.show());
        };
        let row = self.extensions.remove(pos);
        self.access.push(row);
    }

    pub fn get(&self, row: &[char], col: usize) -> Option<&X> {
        self.entries.get(row)?.get(col)?.as_ref()
    }

    pub fn set(&mut self, row: &[char], col: usize, value: X) {
        assert!(col < self.experiments.len(), "column {col} does not exist");
        let entries = self.entries.entry(row.to_vec()).or_default();
        if entries.len() <= col {
            entries.resize(col + 1, None);
        }
        entries[col] = Some(value);
    }

    /// Returns the entry for `row` and `col`. If it is absent, it is computed by calling `compute`
    /// with the row and the experiment of the column.
    pub fn fill_entry<E, F>(&mut self, row: &[char], col: usize, compute: F) -> Result<&X, E>
    where
        F: FnOnce(&[char], &[char]) -> Result<X, E>,
    {
        if self.get(row, col).is_none() {
            let value = compute(row, &self.experiments[col])?;
            self.set(row, col, value);
        }
        Ok(self
            .get(row, col)
            .expect("entry was filled right before"))
    }

    /// Lists all pairs of row and column for which no entry is present.
    pub fn missing_entries(&self) -> Vec<(Word, usize)> {
        self.rows()
            .flat_map(|row| {
                (0..self.experiments.len())
                    .filter(|col| self.get(row, *col).is_none())
                    .map(|col| (row.clone(), col))
            })
            .collect()
    }

    /// Fills all missing entries through `compute` and returns how many were added.
    pub fn fill_missing<E, F>(&mut self, mut compute: F) -> Result<usize, E>
    where
        F: FnMut(&[char], &[char]) -> Result<X, E>,
    {
        let missing = self.missing_entries();
        for (row, col) in &missing {
            self.fill_entry(row, *col, &mut compute)?;
        }
        Ok(missing.len())
    }

    /// Returns the entries of `row`, with `None` for those that are missing.
    pub fn row_signature(&self, row: &[char]) -> Vec<Option<&X>> {
        (0..self.experiments.len())
            .map(|col| self.get(row, col))
            .collect()
    }

    /// Checks whether every extension row equals some access row and records for every row the
    /// first access row with the same signature. Returns the first extension row that escapes.
    pub fn is_closed(&mut self) -> Closedness {
        let mut classes = math::Map::default();
        let escaping = {
            let mut known: math::Map<Vec<Option<&X>>, &Word> = math::Map::default();
            for row in &self.access {
                let representative = *known.entry(self.row_signature(row)).or_insert(row);
                classes.insert(row.clone(), representative.clone());
            }
            self.extensions.iter().find_map(|row| {
                match known.get(&self.row_signature(row)) {
                    Some(representative) => {
                        classes.insert(row.clone(), (*representative).clone());
                        None
                    }
                    None => Some(row.clone()),
                }
            })
        };
        self.equiv_classes = classes;

        match escaping {
            Some(row) => {
                trace!("row {} escapes", row.show());
                Closedness::NotClosed(row)
            }
            None => Closedness::Closed,
        }
    }

    /// The access row whose signature equals that of `row`, as computed by the last call to
    /// [`Self::is_closed`].
    pub fn equivalence_class(&self, row: &[char]) -> Option<&Word> {
        self.equiv_classes.get(row)
    }

    /// The position of the equivalence class of `row` among the access rows.
    pub fn class_index(&self, row: &[char]) -> Option<StateIndex> {
        let representative = self.equivalence_class(row)?;
        self.access.iter().position(|r| r == representative)
    }
}

impl<X: Color> std::fmt::Debug for ObservationTable<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        let mut header = vec!["".to_string(), "row".to_string()];
        for e in &self.experiments {
            header.push(e.show());
        }
        builder.push_record(header);

        for (kind, rows) in [("S", &self.access), ("S·Σ", &self.extensions)] {
            for row in rows {
                let mut record = vec![kind.to_string(), row.show()];
                for col in 0..self.experiments.len() {
                    record.push(match self.get(row, col) {
                        Some(value) => format!("{value:?}"),
                        None => "?".to_string(),
                    });
                }
                builder.push_record(record);
            }
        }

        write!(f, "{}", builder.build())
    }
}

#[cfg(test)]
mod tests {
    use lightbulb_automata::prelude::*;

    use super::{Closedness, ObservationTable};

    fn table() -> ObservationTable<bool> {
        let mut table = ObservationTable::with_experiments([vec![]]);
        table.add_extension_row(vec!['a']);
        table.add_extension_row(vec!['b']);
        table
    }

    #[test]
    fn empty_table_is_closed() {
        let mut table: ObservationTable<bool> = ObservationTable::new();
        assert_eq!(table.is_closed(), Closedness::Closed);
        assert_eq!(table.equivalence_class(&[]), Some(&vec![]));
    }

    #[test]
    fn escaping_row() {
        let mut table = table();
        table.set(&[], 0, false);
        table.set(&['a'], 0, false);
        table.set(&['b'], 0, true);
        assert_eq!(table.is_closed(), Closedness::NotClosed(vec!['b']));

        table.promote(&['b']);
        assert!(table.is_access_row(&['b']));
        assert_eq!(table.is_closed(), Closedness::Closed);
        assert_eq!(table.class_index(&['a']), Some(0));
        assert_eq!(table.class_index(&['b']), Some(1));
    }

    #[test]
    fn filling_entries() {
        let mut table = table();
        let mut queries = vec![];
        let filled = table
            .fill_missing(|row, exp| {
                let word = row.iter().chain(exp).copied().collect::<Word>();
                queries.push(word.clone());
                Ok::<_, ()>(word.len() == 1)
            })
            .unwrap();
        assert_eq!(filled, 3);
        assert_eq!(table.get(&['b'], 0), Some(&true));
        assert!(table.missing_entries().is_empty());

        table.add_experiment(vec!['a']);
        assert_eq!(table.missing_entries().len(), 3);
        assert_eq!(table.fill_entry(&[], 1, |_, _| Ok::<_, ()>(true)), Ok(&true));
        assert_eq!(table.fill_entry(&[], 1, |_, _| Err(())), Ok(&true));
        assert_eq!(queries.len(), 3);
        assert_eq!(table.row_signature(&['a']), vec![Some(&true), None]);

        let rendered = format!("{table:?}");
        assert!(rendered.contains("S·Σ"));
    }
}
