use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub whatsapp_number: String,
    pub last_interaction_date: Option<Date>,
}

/// Identity seam for the chat flow: one user per WhatsApp number, created on
/// first contact.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve(&self, whatsapp_number: &str) -> anyhow::Result<User>;
}

pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn resolve(&self, whatsapp_number: &str) -> anyhow::Result<User> {
        upsert_by_number(&self.db, whatsapp_number).await
    }
}

/// Creates the user on first contact and touches `last_interaction_date` on
/// every message after that.
pub async fn upsert_by_number(db: &PgPool, whatsapp_number: &str) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (whatsapp_number, last_interaction_date)
        VALUES ($1, CURRENT_DATE)
        ON CONFLICT (whatsapp_number) DO UPDATE SET last_interaction_date = CURRENT_DATE
        RETURNING id, whatsapp_number, last_interaction_date
        "#,
    )
    .bind(whatsapp_number)
    .fetch_one(db)
    .await?;
    Ok(user)
}

/// Numbers of users who have not interacted today, for the daily greeting.
pub async fn stale_numbers(db: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT whatsapp_number
        FROM users
        WHERE last_interaction_date IS NULL OR last_interaction_date < CURRENT_DATE
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(n,)| n).collect())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory directory with the same create-on-first-contact contract.
    #[derive(Default)]
    pub(crate) struct MemoryUserDirectory {
        users: Mutex<HashMap<String, User>>,
    }

    #[async_trait]
    impl UserDirectory for MemoryUserDirectory {
        async fn resolve(&self, whatsapp_number: &str) -> anyhow::Result<User> {
            let mut users = self.users.lock().expect("user lock");
            Ok(users
                .entry(whatsapp_number.to_string())
                .or_insert_with(|| User {
                    id: Uuid::new_v4(),
                    whatsapp_number: whatsapp_number.to_string(),
                    last_interaction_date: None,
                })
                .clone())
        }
    }
}
