use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::state::DialogueState;

/// Persists the dialogue state per user between requests. Last write wins;
/// there is no queueing of pending dialogues.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<DialogueState>;
    async fn set(&self, user_id: Uuid, state: &DialogueState) -> anyhow::Result<()>;
}

pub struct PgStateStore {
    db: PgPool,
}

impl PgStateStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StateStore for PgStateStore {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<DialogueState> {
        let row: Option<(String, Option<serde_json::Value>)> =
            sqlx::query_as("SELECT state, context FROM user_state WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        let Some((name, context)) = row else {
            return Ok(DialogueState::None);
        };
        let Some(context) = context else {
            return Ok(DialogueState::None);
        };
        match serde_json::from_value(context) {
            Ok(state) => Ok(state),
            Err(e) => {
                // A context we can no longer read is dropped, not guessed at.
                warn!(error = %e, %user_id, state = %name, "unreadable dialogue context; resetting");
                Ok(DialogueState::None)
            }
        }
    }

    async fn set(&self, user_id: Uuid, state: &DialogueState) -> anyhow::Result<()> {
        let context = serde_json::to_value(state)?;
        sqlx::query(
            r#"
            INSERT INTO user_state (user_id, state, context)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET state = EXCLUDED.state, context = EXCLUDED.context
            "#,
        )
        .bind(user_id)
        .bind(state.name())
        .bind(context)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory stand-in with the same last-write-wins contract.
    #[derive(Default)]
    pub(crate) struct MemoryStateStore {
        states: Mutex<HashMap<Uuid, DialogueState>>,
    }

    #[async_trait]
    impl StateStore for MemoryStateStore {
        async fn get(&self, user_id: Uuid) -> anyhow::Result<DialogueState> {
            Ok(self
                .states
                .lock()
                .expect("state lock")
                .get(&user_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn set(&self, user_id: Uuid, state: &DialogueState) -> anyhow::Result<()> {
            self.states
                .lock()
                .expect("state lock")
                .insert(user_id, state.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryStateStore;
    use super::*;
    use crate::nutrition::ResolvedFood;

    #[tokio::test]
    async fn unknown_user_starts_in_none() {
        let store = MemoryStateStore::default();
        assert_eq!(store.get(Uuid::new_v4()).await.expect("get"), DialogueState::None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips_and_last_write_wins() {
        let store = MemoryStateStore::default();
        let user = Uuid::new_v4();
        let pending = DialogueState::AwaitingMealConfirmation {
            best_guess: ResolvedFood {
                source_name: "Arroz, integral, cozido".into(),
                description: "Arroz, integral, cozido".into(),
                grams: 100.0,
                kcal: 124.0,
                protein_g: 2.6,
                fat_g: 1.0,
                carb_g: 25.8,
            },
            alternatives: vec![],
        };

        store.set(user, &pending).await.expect("set");
        assert_eq!(store.get(user).await.expect("get"), pending);

        store.set(user, &DialogueState::None).await.expect("set");
        assert_eq!(store.get(user).await.expect("get"), DialogueState::None);
    }
}
