//! Sortable, paginated table view over a row set.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{Record, Value};

/// Rows per page when the caller does not choose.
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One column of a multi-column sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses a comma-separated sort spec: `breed,-age_upon_outcome_in_weeks`.
    ///
    /// A leading `-` sorts that column descending. Blank entries are skipped.
    #[must_use]
    pub fn parse_list(spec: &str) -> Vec<SortKey> {
        spec.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "-")
            .map(|s| match s.strip_prefix('-') {
                Some(column) => Self::desc(column),
                None => Self::asc(s),
            })
            .collect()
    }
}

/// A per-column filter typed into the table header.
///
/// `expr` is an operator followed by an operand: `> 52`, `<= 10`, `= Lab`,
/// `!= Pug`, or `contains lab`. A bare operand means equality against numeric
/// cells and case-insensitive `contains` against everything else. Numeric
/// operands compare numerically; text operands compare case-insensitively.
/// Rows without a value in the column never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub expr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOp {
    Compare(Comparison),
    Contains,
    Bare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord.is_eq(),
            Self::Ne => ord.is_ne(),
            Self::Lt => ord.is_lt(),
            Self::Le => ord.is_le(),
            Self::Gt => ord.is_gt(),
            Self::Ge => ord.is_ge(),
        }
    }
}

impl ColumnFilter {
    #[must_use]
    pub fn new(column: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            expr: expr.into(),
        }
    }

    /// Parses a header filter string: `{breed} contains lab && {age} > 52`.
    ///
    /// Clauses without a `{column}` prefix or with an empty expression are
    /// skipped.
    #[must_use]
    pub fn parse_list(spec: &str) -> Vec<ColumnFilter> {
        spec.split("&&")
            .filter_map(|clause| {
                let rest = clause.trim().strip_prefix('{')?;
                let (column, expr) = rest.split_once('}')?;
                let (column, expr) = (column.trim(), expr.trim());
                (!column.is_empty() && !expr.is_empty()).then(|| Self::new(column, expr))
            })
            .collect()
    }

    fn split_expr(&self) -> (FilterOp, &str) {
        let expr = self.expr.trim();
        for (prefix, cmp) in [
            (">=", Comparison::Ge),
            ("<=", Comparison::Le),
            ("!=", Comparison::Ne),
            (">", Comparison::Gt),
            ("<", Comparison::Lt),
            ("=", Comparison::Eq),
        ] {
            if let Some(operand) = expr.strip_prefix(prefix) {
                return (FilterOp::Compare(cmp), operand.trim());
            }
        }
        match expr.strip_prefix("contains ") {
            Some(operand) => (FilterOp::Contains, operand.trim()),
            None => (FilterOp::Bare, expr),
        }
    }

    /// Whether `row` passes this filter.
    #[must_use]
    pub fn matches(&self, row: &Record) -> bool {
        let Some(cell) = row.get_present(&self.column) else {
            return false;
        };
        let (op, operand) = self.split_expr();
        let text = cell.to_text().to_lowercase();
        let needle = operand.to_lowercase();
        let numbers = cell
            .as_number()
            .zip(operand.parse::<f64>().ok().filter(|n| n.is_finite()));

        let cmp = match (op, numbers) {
            (FilterOp::Compare(cmp), _) => cmp,
            (FilterOp::Bare, Some(_)) => Comparison::Eq,
            _ => return text.contains(&needle),
        };
        let ord = numbers.map_or_else(|| text.cmp(&needle), |(x, y)| x.total_cmp(&y));
        cmp.holds(ord)
    }
}

/// Keeps the rows that pass every filter, in their original order.
#[must_use]
pub fn filter_rows(rows: &[Record], filters: &[ColumnFilter]) -> Vec<Record> {
    rows.iter()
        .filter(|row| filters.iter().all(|f| f.matches(row)))
        .cloned()
        .collect()
}

/// One page of the table, plus enough context to render pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePage {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

/// Field names in order of first appearance across the rows.
#[must_use]
pub fn columns(rows: &[Record]) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();
    for row in rows {
        for name in row.field_names() {
            if !seen.contains(name) {
                seen.insert(name.to_string());
            }
        }
    }
    seen.into_iter().collect()
}

/// Stable multi-column sort. Earlier keys take precedence.
///
/// Within a column, absent and null values sort first, then numbers, then
/// strings, then booleans.
#[must_use]
pub fn sort_rows(rows: &[Record], keys: &[SortKey]) -> Vec<Record> {
    let mut sorted = rows.to_vec();
    if keys.is_empty() {
        return sorted;
    }
    sorted.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ord = compare_cells(a.get(&key.column), b.get(&key.column));
                match key.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Int(_) | Value::Float(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Bool(_)) => 3,
        }
    }

    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) if rank(a) == 1 && rank(b) == 1 => {
            let (x, y) = (x.as_number().unwrap_or(0.0), y.as_number().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Cuts one page out of the rows.
///
/// A `page_size` of zero means [`DEFAULT_PAGE_SIZE`]. A page past the end
/// clamps to the last page; an empty row set has one empty page.
#[must_use]
pub fn paginate(rows: &[Record], page: usize, page_size: usize) -> TablePage {
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    let total_rows = rows.len();
    let page_count = total_rows.div_ceil(page_size).max(1);
    let page = page.min(page_count - 1);
    let start = page * page_size;

    TablePage {
        columns: columns(rows),
        rows: rows.iter().skip(start).take(page_size).cloned().collect(),
        page,
        page_size,
        page_count,
        total_rows,
    }
}
