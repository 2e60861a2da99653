pub mod error;
pub mod record;
pub mod user;

use std::fmt::Display;

pub use error::Error;
pub use record::SortField;
pub use sqlx::Error as SqlxError;
use sqlx::sqlite::SqlitePoolOptions;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type Pool = sqlx::Pool<ChosenDB>;

pub const MAX_LIMIT: usize = 10_000;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

pub async fn new_pool(database_url: &str) -> Result<Pool, Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(50)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Wall clock in the server's local zone, falls back to UTC when the local
/// offset cannot be determined.
pub fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Start of the current calendar day, same clock as [now].
pub fn today_midnight() -> PrimitiveDateTime {
    PrimitiveDateTime::new(now().date(), time::Time::MIDNIGHT)
}

#[derive(Debug, Clone, Copy)]
pub enum Order {
    Asc(SortField),
    Desc(SortField),
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Asc(s) => write!(f, "{}", s.as_column()),
            Order::Desc(s) => write!(f, "{} DESC", s.as_column()),
        }
    }
}

pub struct ListingParams {
    pub offset: i64,
    pub limit: i64,
    pub order: Option<Order>,
}

impl Default for ListingParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: MAX_LIMIT as i64,
            order: None,
        }
    }
}

impl ListingParams {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            order: None,
        }
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// ORDER BY clause, empty when no ordering was requested. The field name
    /// comes from [SortField] so the rendered SQL contains only known columns.
    pub fn ordering(&self) -> String {
        match &self.order {
            Some(order) => format!("ORDER BY {}", order),
            None => String::new(),
        }
    }
}

/// One page of rows plus the total count of the unpaged result.
pub struct Batch<T> {
    pub rows: Vec<T>,
    pub total: u64,
    pub offset: i64,
}
