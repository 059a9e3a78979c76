//! Domain types for billwatch-io.

/// A single transaction row, stored as raw string fields.
///
/// The core only interprets the amount column; every other field (date, id,
/// category, ...) passes through untouched so anomaly output keeps the
/// caller's columns byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    fields: Vec<String>,
}

impl TransactionRecord {
    /// Create a record from its raw fields.
    #[must_use]
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Return all raw fields in column order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Return the raw field at `column`, if present.
    #[must_use]
    pub fn get(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// An ordered transaction table: header row plus records indexed by
/// original row position (zero-based, excluding the header).
///
/// Row identity is positional — `records()[i]` is row `i` of the source
/// file — so anomaly results map back to source rows without renumbering.
#[derive(Debug, Clone)]
pub struct TransactionTable {
    headers: Vec<String>,
    records: Vec<TransactionRecord>,
}

impl TransactionTable {
    /// Create a table from a header row and records.
    #[must_use]
    pub fn new(headers: Vec<String>, records: Vec<TransactionRecord>) -> Self {
        Self { headers, records }
    }

    /// Return the header row.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Return the records in original row order.
    #[must_use]
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Return the number of data rows.
    #[must_use]
    pub fn n_records(&self) -> usize {
        self.records.len()
    }

    /// Return `true` if the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Locate a column by name, ASCII case-insensitively, so `amount` and
    /// `Amount` both resolve.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Extract a column as parsed amounts, one entry per record.
    ///
    /// Empty cells and cells spelling NaN are missing (`None`). Cells that
    /// fail to parse are also treated as missing here; `validate_table`
    /// reports them as a hard error beforehand.
    #[must_use]
    pub fn amounts(&self, column: usize) -> Vec<Option<f64>> {
        self.records
            .iter()
            .map(|r| r.get(column).and_then(parse_amount))
            .collect()
    }
}

/// Parse a raw cell as an amount; `None` for missing or unparseable cells.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_nan() => None,
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

/// Return `true` when a raw cell counts as a missing value.
pub(crate) fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || matches!(trimmed.parse::<f64>(), Ok(v) if v.is_nan())
}
