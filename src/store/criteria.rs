//! Typed query criteria for [`super::TableStore::query`].
//!
//! Column identifiers come from the closed [`StoreColumn`] enum and values are checked against the
//! column type when a [`Criterion`] is built, so a query never reaches the store with a column or
//! value the table cannot hold.

use std::fmt;
use std::str::FromStr;

use crate::error::{StockError, StockResult};
use crate::types::{DataType, Field, Schema, Value};

/// A column of the persisted `stocks` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreColumn {
    Id,
    Name,
    Category,
    Quantity,
    UnitPrice,
}

impl StoreColumn {
    /// All columns, in table order.
    pub const ALL: [StoreColumn; 5] = [
        StoreColumn::Id,
        StoreColumn::Name,
        StoreColumn::Category,
        StoreColumn::Quantity,
        StoreColumn::UnitPrice,
    ];

    /// SQL identifier of the column.
    pub fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Category => "category",
            Self::Quantity => "quantity",
            Self::UnitPrice => "unit_price",
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            Self::Id | Self::Quantity => DataType::Int64,
            Self::Name | Self::Category => DataType::Utf8,
            Self::UnitPrice => DataType::Float64,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.data_type() != DataType::Utf8
    }

    /// Convert `value` to the representation stored in this column.
    ///
    /// Integers are widened for `unit_price`; everything else must match the column type exactly.
    /// `Null` is never accepted since every column is `NOT NULL`.
    pub(crate) fn coerce(self, value: Value) -> Result<Value, String> {
        match (self.data_type(), value) {
            (DataType::Float64, Value::Int64(v)) => Ok(Value::Float64(v as f64)),
            (expected, value) if !value.is_null() && value.fits(expected) => Ok(value),
            (expected, value) => Err(format!(
                "column '{}' expects {expected}, got {value:?}",
                self.name()
            )),
        }
    }

    /// [`Self::coerce`] for a value about to be written: numeric columns also reject negatives.
    pub(crate) fn check_stored(self, value: Value) -> Result<Value, String> {
        let value = self.coerce(value)?;
        let negative = match value {
            Value::Int64(v) => v < 0,
            Value::Float64(v) => v < 0.0 || v.is_nan(),
            _ => false,
        };
        if negative {
            return Err(format!(
                "column '{}' must be >= 0, got {value}",
                self.name()
            ));
        }
        Ok(value)
    }
}

impl fmt::Display for StoreColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StoreColumn {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == key)
            .ok_or_else(|| StockError::UnknownColumn(key.to_string()))
    }
}

/// Schema of rows returned by a store query.
pub fn store_schema() -> Schema {
    Schema::new(
        StoreColumn::ALL
            .iter()
            .map(|c| Field::new(c.name(), c.data_type()))
            .collect(),
    )
}

/// One predicate on a store column.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// `column = value`
    Equals(StoreColumn, Value),
    /// `column >= value` (numeric columns only)
    AtLeast(StoreColumn, Value),
    /// `column <= value` (numeric columns only)
    AtMost(StoreColumn, Value),
}

impl Criterion {
    pub fn equals(column: StoreColumn, value: impl Into<Value>) -> StockResult<Self> {
        Ok(Self::Equals(column, checked(column, value.into())?))
    }

    pub fn at_least(column: StoreColumn, value: impl Into<Value>) -> StockResult<Self> {
        require_numeric(column, ">=")?;
        Ok(Self::AtLeast(column, checked(column, value.into())?))
    }

    pub fn at_most(column: StoreColumn, value: impl Into<Value>) -> StockResult<Self> {
        require_numeric(column, "<=")?;
        Ok(Self::AtMost(column, checked(column, value.into())?))
    }

    /// Parse the external `key`/`value` encoding.
    ///
    /// `key` is a column name, optionally suffixed with `>=` or `<=` for a range comparison
    /// (`"quantity>="`, `"unit_price<="`). A bare name means equality. `raw` is parsed according
    /// to the column type.
    pub fn parse(key: &str, raw: &str) -> StockResult<Self> {
        let key = key.trim();
        let (name, build): (&str, fn(StoreColumn, Value) -> StockResult<Self>) =
            if let Some(name) = key.strip_suffix(">=") {
                (name, Self::at_least)
            } else if let Some(name) = key.strip_suffix("<=") {
                (name, Self::at_most)
            } else {
                (key, Self::equals)
            };
        let column: StoreColumn = name.parse()?;
        let value = parse_raw(column, raw)?;
        build(column, value)
    }

    pub fn column(&self) -> StoreColumn {
        match self {
            Self::Equals(c, _) | Self::AtLeast(c, _) | Self::AtMost(c, _) => *c,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Self::Equals(_, v) | Self::AtLeast(_, v) | Self::AtMost(_, v) => v,
        }
    }

    /// SQL comparison operator.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Equals(..) => "=",
            Self::AtLeast(..) => ">=",
            Self::AtMost(..) => "<=",
        }
    }
}

fn checked(column: StoreColumn, value: Value) -> StockResult<Value> {
    column
        .coerce(value)
        .map_err(|message| StockError::InvalidCriterion { message })
}

fn require_numeric(column: StoreColumn, op: &str) -> StockResult<()> {
    if column.is_numeric() {
        Ok(())
    } else {
        Err(StockError::InvalidCriterion {
            message: format!("'{op}' is only supported on numeric columns, not '{column}'"),
        })
    }
}

fn parse_raw(column: StoreColumn, raw: &str) -> StockResult<Value> {
    let invalid = |e: &dyn fmt::Display| StockError::InvalidCriterion {
        message: format!("cannot parse '{raw}' for column '{column}': {e}"),
    };
    let trimmed = raw.trim();
    match column.data_type() {
        DataType::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| invalid(&e)),
        DataType::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| invalid(&e)),
        DataType::Utf8 => Ok(Value::Utf8(raw.to_string())),
    }
}

/// A conjunction of [`Criterion`]s. Empty criteria match every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryCriteria {
    criteria: Vec<Criterion>,
}

impl QueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`QueryCriteria::push`].
    pub fn with(mut self, criterion: Criterion) -> Self {
        self.push(criterion);
        self
    }

    pub fn push(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    /// Parse a list of externally encoded `(key, value)` pairs. See [`Criterion::parse`].
    pub fn parse<I, K, V>(pairs: I) -> StockResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let criteria = pairs
            .into_iter()
            .map(|(k, v)| Criterion::parse(k.as_ref(), v.as_ref()))
            .collect::<StockResult<Vec<_>>>()?;
        Ok(Self { criteria })
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    /// `WHERE` clause (with leading space, empty when there are no criteria) and its parameters,
    /// numbered `?1..?n` in criteria order.
    pub(crate) fn to_where_clause(&self) -> (String, Vec<&Value>) {
        if self.criteria.is_empty() {
            return (String::new(), Vec::new());
        }
        let predicate = self
            .criteria
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} {} ?{}", c.column().name(), c.operator(), i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let params = self.criteria.iter().map(Criterion::value).collect();
        (format!(" WHERE {predicate}"), params)
    }
}

impl FromIterator<Criterion> for QueryCriteria {
    fn from_iter<T: IntoIterator<Item = Criterion>>(iter: T) -> Self {
        Self {
            criteria: iter.into_iter().collect(),
        }
    }
}
