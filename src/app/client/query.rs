//! Row query description shared by every data client
//!
//! A [`RowQuery`] captures one request shape (table, projection, filters,
//! ordering, limit, single-row expectation). The REST client renders it to
//! query parameters; the snapshot client evaluates it in memory.

use std::fmt;

use serde_json::Value;

/// One row filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`. The column may be a dotted path into an embedded
    /// relation, e.g. `category.slug`.
    Eq { column: String, value: String },
    /// Case-insensitive pattern match, `%` matching any run of characters
    ILike { column: String, pattern: String },
    /// `column` is one of `values`
    In { column: String, values: Vec<String> },
    /// Any of the nested filters matches
    AnyOf(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.to_string(),
        }
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::ILike {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    /// Query parameter pair for a top-level filter
    pub fn to_param(&self) -> (String, String) {
        match self {
            Self::Eq { column, value } => (column.clone(), format!("eq.{}", quote(value))),
            Self::ILike { column, pattern } => {
                (column.clone(), format!("ilike.{}", quote(pattern)))
            }
            Self::In { column, values } => (column.clone(), format!("in.{}", render_list(values))),
            Self::AnyOf(filters) => ("or".to_string(), render_group(filters)),
        }
    }

    /// Inline form used inside an `or=(...)` group
    fn to_inline(&self) -> String {
        match self {
            Self::Eq { column, value } => format!("{}.eq.{}", column, quote(value)),
            Self::ILike { column, pattern } => format!("{}.ilike.{}", column, quote(pattern)),
            Self::In { column, values } => format!("{}.in.{}", column, render_list(values)),
            Self::AnyOf(filters) => format!("or{}", render_group(filters)),
        }
    }
}

fn render_group(filters: &[Filter]) -> String {
    let inner: Vec<String> = filters.iter().map(Filter::to_inline).collect();
    format!("({})", inner.join(","))
}

fn render_list(values: &[String]) -> String {
    let inner: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("({})", inner.join(","))
}

/// Double-quote values containing characters reserved by the filter grammar
fn quote(value: &str) -> String {
    if value.chars().any(|c| matches!(c, ',' | '(' | ')' | ':' | '"' | '\\')) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}

/// Single-column ordering; rows without a value sort last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.descending { "desc" } else { "asc" };
        write!(f, "{}.{}.nullslast", self.column, direction)
    }
}

/// Description of one row query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    pub table: String,
    pub select: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub single: bool,
}

impl RowQuery {
    /// Start a query against `table`
    pub fn on(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: None,
            filters: Vec::new(),
            order: None,
            limit: None,
            single: false,
        }
    }

    pub fn select(mut self, projection: impl Into<String>) -> Self {
        self.select = Some(projection.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn in_list<I, S>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn any_of(self, filters: Vec<Filter>) -> Self {
        self.filter(Filter::AnyOf(filters))
    }

    pub fn order(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Expect at most one row
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Render as REST query parameters, in a stable order
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }
        pairs.extend(self.filters.iter().map(Filter::to_param));
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Resolve a possibly dotted column path inside a row
pub fn lookup<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    column
        .split('.')
        .try_fold(row, |value, key| value.get(key))
        .filter(|value| !value.is_null())
}

/// Textual form of a scalar, as it would appear in a filter
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Case-insensitive match of `text` against a `%`/`_` wildcard pattern
pub fn ilike_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();

    // matches[j]: pattern[..i] matches text[..j]
    let mut matches = vec![false; text.len() + 1];
    matches[0] = true;
    for p in &pattern {
        let mut next = vec![false; text.len() + 1];
        match p {
            '%' => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= matches[j];
                    next[j] = seen;
                }
            }
            '_' => {
                for j in 1..=text.len() {
                    next[j] = matches[j - 1];
                }
            }
            c => {
                for j in 1..=text.len() {
                    next[j] = matches[j - 1] && text[j - 1] == *c;
                }
            }
        }
        matches = next;
    }
    matches[text.len()]
}

impl Filter {
    /// Evaluate against a JSON row
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Self::Eq { column, value } => lookup(row, column)
                .and_then(scalar_text)
                .is_some_and(|actual| actual == *value),
            Self::ILike { column, pattern } => lookup(row, column)
                .and_then(Value::as_str)
                .is_some_and(|actual| ilike_matches(actual, pattern)),
            Self::In { column, values } => lookup(row, column)
                .and_then(scalar_text)
                .is_some_and(|actual| values.contains(&actual)),
            Self::AnyOf(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}
