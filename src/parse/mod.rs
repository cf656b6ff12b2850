use thiserror::Error;
use tracing::debug;

/// Header fragments that identify each logical column, matched case-sensitive
/// as substrings of the trimmed header text. These are tied to the source
/// table's vocabulary.
pub const NUMBER_FRAGMENT: &str = "ТК";
pub const ADDRESS_FRAGMENT: &str = "Адрес";
pub const POSITION_FRAGMENT: &str = "Должность";
pub const COUNT_FRAGMENT: &str = "Сколько нужно людей";
pub const CASH_FRAGMENT: &str = "Тариф";

/// The header row is malformed in a way no amount of row skipping can fix;
/// the whole run aborts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("table has no header row")]
    EmptyTable,
    #[error("required column `{0}` not found in header row")]
    MissingColumn(&'static str),
}

/// Physical column positions for the logical fields, resolved once from the
/// header row. `number` is optional; the rest are required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    pub number: Option<usize>,
    pub address: usize,
    pub position: usize,
    pub count: usize,
    pub cash: usize,
}

impl ColumnIndex {
    /// Scans headers in order; the first header containing a fragment wins.
    pub fn from_headers(headers: &[String]) -> Result<Self, SchemaError> {
        let find = |fragment: &str| headers.iter().position(|h| h.trim().contains(fragment));
        let require =
            |fragment: &'static str| find(fragment).ok_or(SchemaError::MissingColumn(fragment));

        Ok(Self {
            number: find(NUMBER_FRAGMENT),
            address: require(ADDRESS_FRAGMENT)?,
            position: require(POSITION_FRAGMENT)?,
            count: require(COUNT_FRAGMENT)?,
            cash: require(CASH_FRAGMENT)?,
        })
    }

    fn max_required(&self) -> usize {
        self.address
            .max(self.position)
            .max(self.count)
            .max(self.cash)
    }
}

/// One validated data row. String fields are trimmed and non-empty; numeric
/// fields were parsed leniently and are never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub number: i64,
    pub address: String,
    pub position: String,
    pub count: i64,
    pub cash: i64,
}

/// Parses a header-plus-rows table into validated rows.
///
/// Schema problems are fatal; individual bad data rows are skipped, never an
/// error. Pure transform, no side effects beyond debug logging.
pub fn parse_table(rows: &[Vec<String>]) -> Result<(ColumnIndex, Vec<ParsedRow>), SchemaError> {
    let headers = rows.first().ok_or(SchemaError::EmptyTable)?;
    let index = ColumnIndex::from_headers(headers)?;

    let parsed: Vec<ParsedRow> = rows[1..]
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let parsed = parse_row(&index, row);
            if parsed.is_none() {
                debug!(row = i + 1, cells = row.len(), "row failed validation, skipped");
            }
            parsed
        })
        .collect();

    Ok((index, parsed))
}

fn parse_row(index: &ColumnIndex, row: &[String]) -> Option<ParsedRow> {
    if row.len() <= index.max_required() {
        return None;
    }
    let address = row[index.address].trim();
    let position = row[index.position].trim();
    if address.is_empty() || position.is_empty() {
        return None;
    }
    Some(ParsedRow {
        number: index.number.map_or(0, |i| lenient_int(row.get(i))),
        address: address.to_string(),
        position: position.to_string(),
        count: lenient_int(row.get(index.count)),
        cash: lenient_int(row.get(index.cash)),
    })
}

/// Missing, non-numeric, and negative cells all coerce to 0.
fn lenient_int(cell: Option<&String>) -> i64 {
    cell.and_then(|c| c.trim().parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .unwrap_or(0)
}
