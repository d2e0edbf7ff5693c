// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::query::Query;
use sqlx::{Row, Sqlite};
use std::fmt;

/// A single column value, bound positionally into generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
    Timestamp(DateTime<Utc>),
    Null,
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Column definition used both for `CREATE TABLE` and for adding missing
/// columns to an existing table.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub decl: &'static str,
    pub indexed: bool,
}

impl Column {
    pub const fn new(name: &'static str, decl: &'static str) -> Self {
        Self { name, decl, indexed: false }
    }

    pub const fn indexed(name: &'static str, decl: &'static str) -> Self {
        Self { name, decl, indexed: true }
    }
}

/// Row shape of one entity family, mapped to one table.
pub trait Entity: Sized + Send + Sync + Unpin + 'static {
    type Id: Clone + fmt::Debug + fmt::Display + Send + Sync + Into<Value>;

    /// Human readable family name used in error messages.
    const NAME: &'static str;
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    const COLUMNS: &'static [Column];

    fn id(&self) -> Self::Id;

    /// Whether `id` can possibly address a stored row.
    fn is_addressable(id: &Self::Id) -> bool;

    /// Persisted values keyed by column. The id column may be left out when
    /// the engine is expected to assign it.
    fn values(&self) -> Vec<(&'static str, Value)>;

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;

    fn assign_id(&mut self, _rowid: i64) {}

    fn stamp_created(&mut self, _now: DateTime<Utc>) {}

    fn stamp_updated(&mut self, _existing: &Self, _now: DateTime<Utc>) {}
}

/// Entities carrying a creation timestamp column usable for retention.
pub trait Timestamped: Entity {
    const CREATED_AT_COLUMN: &'static str;
}

/// Fixed-width UTC rendering, so lexical order matches chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

pub fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    parse_timestamp(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub fn optional_timestamp_column(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| {
        parse_timestamp(&raw).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Text(text) => query.bind(text),
        Value::Integer(int) => query.bind(int),
        Value::Real(real) => query.bind(real),
        Value::Timestamp(ts) => query.bind(format_timestamp(&ts)),
        Value::Null => query.bind(None::<String>),
    }
}
