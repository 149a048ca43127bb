use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;
use crate::dialogue::store::{PgStateStore, StateStore};
use crate::meals::{MealLedger, PgMealLedger};
use crate::nlp::{IntentClassifier, WitClient};
use crate::nutrition::{FoodTable, PgFoodTable};
use crate::outbound::{MessageSender, TwilioSender};
use crate::reminders::scheduler::{CronScheduler, ReminderScheduler};
use crate::users::{PgUserDirectory, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub foods: Arc<dyn FoodTable>,
    pub states: Arc<dyn StateStore>,
    pub users: Arc<dyn UserDirectory>,
    pub meals: Arc<dyn MealLedger>,
    pub sender: Arc<dyn MessageSender>,
    pub scheduler: Arc<dyn ReminderScheduler>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let classifier = Arc::new(WitClient::new(config.wit.clone())?);
        let sender: Arc<dyn MessageSender> = Arc::new(TwilioSender::new(config.twilio.clone())?);
        let scheduler = Arc::new(CronScheduler::new(sender.clone()));

        Ok(Self::from_parts(
            db.clone(),
            config,
            classifier,
            Arc::new(PgFoodTable::new(db.clone())),
            Arc::new(PgStateStore::new(db.clone())),
            Arc::new(PgUserDirectory::new(db.clone())),
            Arc::new(PgMealLedger::new(db)),
            sender,
            scheduler,
        ))
    }

    /// Assembles a state from explicit parts; the seams let callers swap in
    /// in-memory implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        classifier: Arc<dyn IntentClassifier>,
        foods: Arc<dyn FoodTable>,
        states: Arc<dyn StateStore>,
        users: Arc<dyn UserDirectory>,
        meals: Arc<dyn MealLedger>,
        sender: Arc<dyn MessageSender>,
        scheduler: Arc<dyn ReminderScheduler>,
    ) -> Self {
        Self {
            db,
            config,
            classifier,
            foods,
            states,
            users,
            meals,
            sender,
            scheduler,
        }
    }
}
