pub mod candidature;
pub mod department;
pub mod hiring_request;
pub mod notification;
pub mod transition_log;
pub mod user;
pub mod webhook_log;

use sqlx::{postgres::PgRow, Row};
use std::str::FromStr;

/// Reads a TEXT column into one of the closed enums of the domain.
pub(crate) fn decode_text<T>(row: &PgRow, column: &str) -> sqlx::Result<T>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: T::Err| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.into(),
    })
}
