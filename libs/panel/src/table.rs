//! Search filtering and ordering of dashboard tables
//!
//! A table is anything implementing [`TableBody`]: the browser binding walks
//! real `<tr>` elements, [`MemoryTable`] keeps rows in a `Vec`. Re-appending a
//! row moves it to the end of the body, so sorting reorders rows in place and
//! never touches their contents or visibility.

use std::cmp::Ordering;
use std::convert::Infallible;

/// Row ordering selected in a table's sort control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Name, A to Z
    Az,
    /// Name, Z to A
    Za,
    /// Highest insertion index first
    Newest,
    /// Insertion order
    #[default]
    Oldest,
}

impl SortMode {
    /// Parse a selector value. Unknown values mean insertion order.
    pub fn from_value(value: &str) -> Self {
        match value {
            "az" => SortMode::Az,
            "za" => SortMode::Za,
            "newest" => SortMode::Newest,
            _ => SortMode::Oldest,
        }
    }

    pub fn as_value(&self) -> &'static str {
        match self {
            SortMode::Az => "az",
            SortMode::Za => "za",
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
        }
    }

    fn compare<C: Collate + ?Sized>(
        &self,
        a: &SortKey,
        b: &SortKey,
        collator: &C,
    ) -> Ordering {
        match self {
            SortMode::Az => collator.compare(&a.name, &b.name),
            SortMode::Za => collator.compare(&b.name, &a.name),
            SortMode::Newest => b.index.cmp(&a.index),
            SortMode::Oldest => a.index.cmp(&b.index),
        }
    }
}

/// String collation used for name ordering
pub trait Collate {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Case-insensitive code point collation
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFold;

impl Collate for CaseFold {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase))
            .then_with(|| a.cmp(b))
    }
}

impl<F: Fn(&str, &str) -> Ordering> Collate for F {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        self(a, b)
    }
}

/// Access to the rows of one table body
pub trait TableBody {
    /// Handle to a row; cloning must not copy the row itself
    type Row: Clone;
    type Error;

    /// Rows in their current order
    fn rows(&self) -> Result<Vec<Self::Row>, Self::Error>;

    /// Text of the row's name cell, `None` when the row has no such cell
    fn name(&self, row: &Self::Row) -> Result<Option<String>, Self::Error>;

    /// Raw value of the row's insertion-index marker
    fn index_marker(&self, row: &Self::Row) -> Option<String>;

    fn set_visible(&mut self, row: &Self::Row, visible: bool) -> Result<(), Self::Error>;

    /// Move the row to the end of the body
    fn append(&mut self, row: &Self::Row) -> Result<(), Self::Error>;
}

/// Outcome of one filter/sort pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    /// Rows matching the query
    pub shown: usize,
    /// Rows hidden by the query
    pub hidden: usize,
    /// Rows without a name cell, left as they were
    pub untouched: usize,
    /// Rows reordered by the sort
    pub sorted: usize,
}

struct SortKey {
    index: i64,
    name: String,
}

/// Parse an insertion index the way `parseInt(value, 10)` does: leading
/// whitespace, an optional sign, then at least one decimal digit. Trailing
/// garbage is ignored. Values beyond `i64` saturate, keeping their order.
pub fn parse_index(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let value = rest[..digits].bytes().fold(0i64, |acc, b| {
        let digit = i64::from(b - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        }
    });
    Some(value)
}

/// Filter rows by `query` and reorder the indexed rows by `mode`.
///
/// Every row with a name cell is shown iff its lowercased name contains the
/// lowercased query; rows without one keep their visibility. Only rows with a
/// numeric index marker take part in the ordering and are re-appended.
pub fn filter_and_sort<T, C>(
    table: &mut T,
    query: &str,
    mode: SortMode,
    collator: &C,
) -> Result<FilterSummary, T::Error>
where
    T: TableBody,
    C: Collate + ?Sized,
{
    let query = query.to_lowercase();
    let mut summary = FilterSummary::default();
    let mut data_rows: Vec<(T::Row, SortKey)> = Vec::new();

    for row in table.rows()? {
        let name = table.name(&row)?;

        match &name {
            Some(text) => {
                let shown = text.to_lowercase().contains(&query);
                table.set_visible(&row, shown)?;
                if shown {
                    summary.shown += 1;
                } else {
                    summary.hidden += 1;
                }
            }
            None => summary.untouched += 1,
        }

        if let Some(index) = table.index_marker(&row).as_deref().and_then(parse_index) {
            let name = name
                .map(|n| n.to_lowercase().trim().to_string())
                .unwrap_or_default();
            data_rows.push((row, SortKey { index, name }));
        }
    }

    // Stable: equal keys keep their current relative order
    data_rows.sort_by(|(_, a), (_, b)| mode.compare(a, b, collator));

    for (row, _) in &data_rows {
        table.append(row)?;
    }
    summary.sorted = data_rows.len();

    Ok(summary)
}

/// Row of a [`MemoryTable`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRow {
    pub name: Option<String>,
    pub index: Option<String>,
    pub visible: bool,
}

impl MemoryRow {
    /// Data row with a name cell and an insertion index
    pub fn data(index: i64, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            index: Some(index.to_string()),
            visible: true,
        }
    }

    /// Row without name cell or index, e.g. an empty-table message
    pub fn placeholder() -> Self {
        Self {
            name: None,
            index: None,
            visible: true,
        }
    }
}

/// Table body kept in memory, with DOM-like append semantics
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    rows: Vec<(usize, MemoryRow)>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: MemoryRow) {
        let id = self.rows.len();
        self.rows.push((id, row));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in body order
    pub fn iter(&self) -> impl Iterator<Item = &MemoryRow> {
        self.rows.iter().map(|(_, row)| row)
    }

    /// Names of visible rows, in body order
    pub fn visible_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|r| r.visible)
            .filter_map(|r| r.name.as_deref())
            .collect()
    }

    fn position(&self, id: usize) -> Option<usize> {
        self.rows.iter().position(|(row_id, _)| *row_id == id)
    }
}

impl FromIterator<MemoryRow> for MemoryTable {
    fn from_iter<I: IntoIterator<Item = MemoryRow>>(iter: I) -> Self {
        let mut table = MemoryTable::new();
        for row in iter {
            table.push(row);
        }
        table
    }
}

impl TableBody for MemoryTable {
    type Row = usize;
    type Error = Infallible;

    fn rows(&self) -> Result<Vec<usize>, Infallible> {
        Ok(self.rows.iter().map(|(id, _)| *id).collect())
    }

    fn name(&self, row: &usize) -> Result<Option<String>, Infallible> {
        Ok(self
            .position(*row)
            .and_then(|pos| self.rows[pos].1.name.clone()))
    }

    fn index_marker(&self, row: &usize) -> Option<String> {
        self.position(*row)
            .and_then(|pos| self.rows[pos].1.index.clone())
    }

    fn set_visible(&mut self, row: &usize, visible: bool) -> Result<(), Infallible> {
        if let Some(pos) = self.position(*row) {
            self.rows[pos].1.visible = visible;
        }
        Ok(())
    }

    fn append(&mut self, row: &usize) -> Result<(), Infallible> {
        if let Some(pos) = self.position(*row) {
            let entry = self.rows.remove(pos);
            self.rows.push(entry);
        }
        Ok(())
    }
}
