//! User accounts. Schema and finders mirror what the surrounding
//! application expects, but no HTTP endpoint exposes them yet.

use futures::{StreamExt as _, TryStreamExt as _};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::PrimitiveDateTime;

use crate::{Error, error::Result};

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[garde(length(min = 1, max = 50))]
    pub username: String,
    #[garde(length(min = 1, max = 100))]
    pub password: String,
    #[garde(length(min = 3, max = 100))]
    pub email: String,
    #[garde(length(max = 50))]
    pub full_name: Option<String>,
    #[garde(length(max = 20))]
    pub role: Option<String>,
    #[garde(length(max = 500))]
    pub api_key: Option<String>,
}

/// Public shape, password stays out of it.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub active: bool,
    pub api_key: Option<String>,
    pub last_login: Option<PrimitiveDateTime>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

const USER_COLUMNS: &str =
    "id, username, email, full_name, role, active, api_key, last_login, created_at, updated_at";

pub type UserRepository = UserRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct UserRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateUser) -> Result<User> {
        let now = crate::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password, email, full_name, role, active, api_key, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?)",
        )
        .bind(&payload.username)
        .bind(&payload.password)
        .bind(&payload.email)
        .bind(&payload.full_name)
        .bind(&payload.role)
        .bind(&payload.api_key)
        .bind(now)
        .bind(now)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.executor)
        .await?;
        user.ok_or_else(|| Error::RecordNotFound(format!("User {id}")))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.executor)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.executor)
        .await?;
        Ok(user)
    }

    pub async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE api_key = ?"
        ))
        .bind(api_key)
        .fetch_optional(&self.executor)
        .await?;
        Ok(user)
    }

    pub async fn exists_by_username(&self, username: &str) -> Result<bool> {
        let count: u64 = sqlx::query_scalar("SELECT count(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.executor)
            .await?;
        Ok(count > 0)
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let count: u64 = sqlx::query_scalar("SELECT count(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.executor)
            .await?;
        Ok(count > 0)
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users"))
            .fetch(&self.executor)
            .take(limit)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(users)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("User {id}")))
        } else {
            Ok(())
        }
    }
}
