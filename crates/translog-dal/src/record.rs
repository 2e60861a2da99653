use std::str::FromStr;

use futures::{StreamExt as _, TryStreamExt as _};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::PrimitiveDateTime;
use tracing::debug;

use crate::{Batch, Error, ListingParams, error::Result};

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTranslationRecord {
    #[garde(length(min = 1))]
    pub original_text: String,
    #[garde(length(min = 1))]
    pub translated_text: String,
    #[garde(length(min = 1, max = 10))]
    pub source_lang: String,
    #[garde(length(min = 1, max = 10))]
    pub target_lang: String,
    #[garde(length(max = 50))]
    pub user_id: Option<String>,
    #[garde(length(max = 100))]
    pub ip_address: Option<String>,
    #[garde(length(max = 50))]
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub id: i64,
    pub original_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub model: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

/// Columns a listing may be ordered by. Parsed from the API-side camelCase
/// name, so an unknown field is rejected before any SQL is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    SourceLang,
    TargetLang,
    UserId,
    Model,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn as_column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::SourceLang => "source_lang",
            SortField::TargetLang => "target_lang",
            SortField::UserId => "user_id",
            SortField::Model => "model",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "sourceLang" => Ok(SortField::SourceLang),
            "targetLang" => Ok(SortField::TargetLang),
            "userId" => Ok(SortField::UserId),
            "model" => Ok(SortField::Model),
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            _ => Err(Error::InvalidSortField(s.to_string())),
        }
    }
}

pub type TranslationRecordRepository = TranslationRecordRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct TranslationRecordRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> TranslationRecordRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateTranslationRecord) -> Result<TranslationRecord> {
        let now = crate::now();
        let result = sqlx::query(
            "INSERT INTO translation_records \
             (original_text, translated_text, source_lang, target_lang, user_id, ip_address, model, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.original_text)
        .bind(&payload.translated_text)
        .bind(&payload.source_lang)
        .bind(&payload.target_lang)
        .bind(&payload.user_id)
        .bind(&payload.ip_address)
        .bind(&payload.model)
        .bind(now)
        .bind(now)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    /// Full replace, refreshes updated_at and keeps created_at.
    pub async fn update(&self, id: i64, payload: CreateTranslationRecord) -> Result<TranslationRecord> {
        let result = sqlx::query(
            "UPDATE translation_records SET \
             original_text = ?, translated_text = ?, source_lang = ?, target_lang = ?, \
             user_id = ?, ip_address = ?, model = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&payload.original_text)
        .bind(&payload.translated_text)
        .bind(&payload.source_lang)
        .bind(&payload.target_lang)
        .bind(&payload.user_id)
        .bind(&payload.ip_address)
        .bind(&payload.model)
        .bind(crate::now())
        .bind(id)
        .execute(&self.executor)
        .await?;

        if result.rows_affected() == 0 {
            debug!("Update of missing translation record {id}");
            Err(Error::RecordNotFound(format!("TranslationRecord {id}")))
        } else {
            self.get(id).await
        }
    }

    pub async fn get(&self, id: i64) -> Result<TranslationRecord> {
        self.find(id)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("TranslationRecord {id}")))
    }

    /// Lookup by id, absence is a normal outcome.
    pub async fn find(&self, id: i64) -> Result<Option<TranslationRecord>> {
        let record = sqlx::query_as::<_, TranslationRecord>(
            "SELECT * FROM translation_records WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.executor)
        .await?;
        Ok(record)
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<TranslationRecord>> {
        let records = sqlx::query_as::<_, TranslationRecord>(
            "SELECT * FROM translation_records WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch(&self.executor)
        .take(crate::MAX_LIMIT)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(records)
    }

    pub async fn list_by_user_paged(
        &self,
        user_id: &str,
        params: ListingParams,
    ) -> Result<Batch<TranslationRecord>> {
        let total: u64 =
            sqlx::query_scalar("SELECT count(*) FROM translation_records WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.executor)
                .await?;

        let sql = format!(
            "SELECT * FROM translation_records WHERE user_id = ? {} LIMIT ? OFFSET ?",
            params.ordering()
        );
        let rows = sqlx::query_as::<_, TranslationRecord>(&sql)
            .bind(user_id)
            .bind(params.limit)
            .bind(params.offset)
            .fetch(&self.executor)
            .take(crate::MAX_LIMIT)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(Batch {
            rows,
            total,
            offset: params.offset,
        })
    }

    pub async fn list_by_langs(
        &self,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<TranslationRecord>> {
        let records = sqlx::query_as::<_, TranslationRecord>(
            "SELECT * FROM translation_records WHERE source_lang = ? AND target_lang = ?",
        )
        .bind(source_lang)
        .bind(target_lang)
        .fetch(&self.executor)
        .take(crate::MAX_LIMIT)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(records)
    }

    /// Records with created_at in [start, end).
    pub async fn list_by_created_between(
        &self,
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
    ) -> Result<Vec<TranslationRecord>> {
        let records = sqlx::query_as::<_, TranslationRecord>(
            "SELECT * FROM translation_records WHERE created_at >= ? AND created_at < ?",
        )
        .bind(start)
        .bind(end)
        .fetch(&self.executor)
        .take(crate::MAX_LIMIT)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(records)
    }

    pub async fn count_created_between(
        &self,
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
    ) -> Result<u64> {
        let count: u64 = sqlx::query_scalar(
            "SELECT count(*) FROM translation_records WHERE created_at >= ? AND created_at < ?",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.executor)
        .await?;
        Ok(count)
    }

    /// Substring match over original_text OR translated_text, AND exact
    /// user_id, each filter optional. Case sensitivity is whatever the
    /// store's LIKE does.
    pub async fn search(
        &self,
        text: Option<&str>,
        user_id: Option<&str>,
        params: ListingParams,
    ) -> Result<Batch<TranslationRecord>> {
        let mut conditions = Vec::new();
        if text.is_some() {
            conditions.push("(original_text LIKE ? OR translated_text LIKE ?)");
        }
        if user_id.is_some() {
            conditions.push("user_id = ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let pattern = text.map(|t| format!("%{}%", t));

        let count_sql = format!("SELECT count(*) FROM translation_records {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, u64>(&count_sql);
        if let Some(pattern) = &pattern {
            count_query = count_query.bind(pattern).bind(pattern);
        }
        if let Some(user_id) = user_id {
            count_query = count_query.bind(user_id);
        }
        let total = count_query.fetch_one(&self.executor).await?;

        let sql = format!(
            "SELECT * FROM translation_records {} {} LIMIT ? OFFSET ?",
            where_clause,
            params.ordering()
        );
        let mut query = sqlx::query_as::<_, TranslationRecord>(&sql);
        if let Some(pattern) = &pattern {
            query = query.bind(pattern).bind(pattern);
        }
        if let Some(user_id) = user_id {
            query = query.bind(user_id);
        }
        let rows = query
            .bind(params.limit)
            .bind(params.offset)
            .fetch(&self.executor)
            .take(crate::MAX_LIMIT)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(Batch {
            rows,
            total,
            offset: params.offset,
        })
    }

    /// Idempotent, deleting a missing id is a no-op success.
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM translation_records WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;
        Ok(())
    }

    pub async fn list_all(&self, params: ListingParams) -> Result<Batch<TranslationRecord>> {
        let total = self.count().await?;

        let sql = format!(
            "SELECT * FROM translation_records {} LIMIT ? OFFSET ?",
            params.ordering()
        );
        let rows = sqlx::query_as::<_, TranslationRecord>(&sql)
            .bind(params.limit)
            .bind(params.offset)
            .fetch(&self.executor)
            .take(crate::MAX_LIMIT)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(Batch {
            rows,
            total,
            offset: params.offset,
        })
    }

    pub async fn count(&self) -> Result<u64> {
        let count: u64 = sqlx::query_scalar("SELECT count(*) FROM translation_records")
            .fetch_one(&self.executor)
            .await?;
        Ok(count)
    }
}
