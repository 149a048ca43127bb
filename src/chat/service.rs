use std::collections::BTreeMap;

use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::dialogue::controller::{self, DialogueOutcome};
use crate::dialogue::DialogueState;
use crate::error::ChatError;
use crate::nlp::{normalize_message, ClassifierResponse, Entities, Intent, NormalizedMessage, TimeField};
use crate::nutrition::query::build_queries;
use crate::nutrition::{FoodMatcher, ResolvedFood};
use crate::reminders;
use crate::state::AppState;
use crate::tracking::{exercise, goals, weight};
use crate::users::User;
use crate::{meals, nutrition};

use super::replies;

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// One inbound message, end to end: classify, consult the pending dialogue,
/// route, persist the next state, reply. Reads and writes of the per-user
/// state are last-write-wins; see the store contract.
pub async fn process_message(state: &AppState, from: &str, body: &str) -> Result<String, ChatError> {
    let user = state
        .users
        .resolve(from)
        .await
        .map_err(ChatError::Persistence)?;

    // A classifier outage must not strand a pending dialogue; replies like
    // "sim" are interpreted from stored context without it.
    let classified = match state.classifier.classify(body).await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "classifier unavailable; treating message as unclassified");
            ClassifierResponse::default()
        }
    };
    let message = normalize_message(&classified, state.config.intent_confidence_threshold);
    let pending = state
        .states
        .get(user.id)
        .await
        .map_err(ChatError::Persistence)?;
    info!(user = %user.whatsapp_number, intent = ?message.intent, state = pending.name(), "inbound message");

    let (reply, next_state) = match controller::advance(pending, message.intent, body) {
        DialogueOutcome::PassThrough | DialogueOutcome::Interrupted => {
            route_intent(state, &user, &message)
                .await
                .map_err(ChatError::Persistence)?
        }
        DialogueOutcome::CommitMeal(food) => {
            let reply = commit_meal(state, &user, &food)
                .await
                .map_err(ChatError::Persistence)?;
            (reply, DialogueState::None)
        }
        DialogueOutcome::OfferAlternatives { options } => (
            replies::alternatives_list(&options),
            DialogueState::AwaitingAlternativeSelection { options },
        ),
        DialogueOutcome::NothingToOffer => (replies::nothing_else(), DialogueState::None),
        DialogueOutcome::Cancelled => (replies::cancelled(), DialogueState::None),
        DialogueOutcome::DeleteEntry(id) => {
            let removed = state
                .meals
                .delete(id)
                .await
                .map_err(ChatError::Persistence)?;
            let reply = if removed > 0 {
                replies::meal_deleted()
            } else {
                replies::meal_already_gone()
            };
            (reply, DialogueState::None)
        }
        DialogueOutcome::Reprompt(kept) => {
            let reply = match &kept {
                DialogueState::AwaitingMealConfirmation { best_guess, .. } => {
                    replies::reprompt_confirmation(best_guess)
                }
                DialogueState::AwaitingAlternativeSelection { .. } => replies::reprompt_selection(),
                DialogueState::AwaitingDeleteNumber { .. } => replies::reprompt_delete(),
                DialogueState::None => replies::help(),
            };
            (reply, kept)
        }
    };

    state
        .states
        .set(user.id, &next_state)
        .await
        .map_err(ChatError::StateWrite)?;

    Ok(replies::truncate(reply, state.config.reply_budget))
}

async fn route_intent(
    state: &AppState,
    user: &User,
    message: &NormalizedMessage,
) -> anyhow::Result<(String, DialogueState)> {
    let e = &message.entities;
    match message.intent {
        Intent::LogMeal => log_meal(state, e).await,
        Intent::LogWeight => log_weight(state, user, e).await,
        Intent::LogExercise => log_exercise(state, user, e).await,
        Intent::DailySummary => daily_summary(state, user).await,
        Intent::ListMeals => list_meals(state, user).await,
        Intent::DeleteMeal => delete_meal(state, user).await,
        Intent::SetGoal => set_goal(state, user, e).await,
        Intent::ListGoals => list_goals(state, user).await,
        Intent::SetReminder => set_reminder(state, user, e).await,
        Intent::ListReminders => list_reminders(state, user).await,
        Intent::CancelReminder => cancel_reminder(state, user, e).await,
        Intent::Greeting => Ok((replies::greeting(), DialogueState::None)),
        Intent::None => Ok((replies::help(), DialogueState::None)),
    }
}

/// Meal logging never writes directly: the best guess goes into a
/// confirmation dialogue and is committed only on an affirmative reply.
async fn log_meal(state: &AppState, e: &Entities) -> anyhow::Result<(String, DialogueState)> {
    let queries = build_queries(&e.food_items, &e.quantities);
    if queries.is_empty() {
        return Ok((replies::restate_meal(), DialogueState::None));
    }

    let matcher = FoodMatcher::new(state.foods.clone());
    for query in &queries {
        if let Some(best_guess) = matcher.best_match(query).await? {
            let mut alternatives = matcher.alternatives(query).await?;
            alternatives.retain(|a| a.source_name != best_guess.source_name);
            let reply = replies::confirm_meal(&best_guess);
            return Ok((
                reply,
                DialogueState::AwaitingMealConfirmation {
                    best_guess,
                    alternatives,
                },
            ));
        }
    }
    Ok((replies::no_nutrition_data(&queries[0]), DialogueState::None))
}

async fn commit_meal(state: &AppState, user: &User, food: &ResolvedFood) -> anyhow::Result<String> {
    state.meals.add(user.id, food).await?;
    let entries = state.meals.list_for_day(user.id, today()).await?;
    let totals = meals::service::totals(&entries);
    let goal_line = match state.meals.calorie_target(user.id).await? {
        Some(target) => replies::goal_feedback(target, totals.kcal),
        None => replies::no_goal_hint(),
    };
    Ok(replies::meal_logged(food, &goal_line))
}

async fn log_weight(
    state: &AppState,
    user: &User,
    e: &Entities,
) -> anyhow::Result<(String, DialogueState)> {
    match e.weight_value {
        Some(kg) if kg > 0.0 => {
            weight::add(&state.db, user.id, kg).await?;
            Ok((replies::weight_logged(kg), DialogueState::None))
        }
        _ => Ok((replies::ask_weight(), DialogueState::None)),
    }
}

const DEFAULT_WEIGHT_KG: f64 = 70.0;

async fn log_exercise(
    state: &AppState,
    user: &User,
    e: &Entities,
) -> anyhow::Result<(String, DialogueState)> {
    let (Some(activity), Some(value)) = (e.activity_names.first(), e.duration_value) else {
        return Ok((replies::ask_exercise(), DialogueState::None));
    };
    let unit = e.duration_units.first().map(String::as_str).unwrap_or("minutos");
    let minutes = if is_hour_unit(unit) { value * 60.0 } else { value };

    let weight_kg = weight::latest(&state.db, user.id)
        .await?
        .unwrap_or(DEFAULT_WEIGHT_KG);
    match exercise::calories_burned(activity, minutes, weight_kg) {
        Some(kcal) => {
            exercise::add(&state.db, user.id, activity, minutes.round() as i32, kcal).await?;
            Ok((
                replies::exercise_logged(activity, minutes, kcal),
                DialogueState::None,
            ))
        }
        None => Ok((replies::exercise_unknown(activity), DialogueState::None)),
    }
}

fn is_hour_unit(unit: &str) -> bool {
    matches!(
        nutrition::normalize::normalize(unit).trim(),
        "hora" | "horas" | "hr" | "h" | "hour" | "hours"
    )
}

async fn daily_summary(state: &AppState, user: &User) -> anyhow::Result<(String, DialogueState)> {
    let day = today();
    let entries = state.meals.list_for_day(user.id, day).await?;
    let totals = meals::service::totals(&entries);
    let exercises = exercise::list_for_day(&state.db, user.id, day).await?;
    let last_weight = weight::latest(&state.db, user.id).await?;
    Ok((
        replies::daily_summary(&entries, &totals, &exercises, last_weight),
        DialogueState::None,
    ))
}

async fn list_meals(state: &AppState, user: &User) -> anyhow::Result<(String, DialogueState)> {
    let entries = state.meals.list_for_day(user.id, today()).await?;
    if entries.is_empty() {
        return Ok((replies::no_meals_today(), DialogueState::None));
    }
    let totals = meals::service::totals(&entries);
    Ok((replies::meals_list(&entries, &totals), DialogueState::None))
}

async fn delete_meal(state: &AppState, user: &User) -> anyhow::Result<(String, DialogueState)> {
    let entries = state.meals.list_for_day(user.id, today()).await?;
    if entries.is_empty() {
        return Ok((replies::no_meals_today(), DialogueState::None));
    }
    let index_to_id: BTreeMap<String, i64> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| ((i + 1).to_string(), entry.id))
        .collect();
    Ok((
        replies::delete_prompt(&entries),
        DialogueState::AwaitingDeleteNumber {
            entries: index_to_id,
        },
    ))
}

async fn set_goal(
    state: &AppState,
    user: &User,
    e: &Entities,
) -> anyhow::Result<(String, DialogueState)> {
    let (Some(goal_type), Some(target)) = (e.goal_types.first(), e.target_value) else {
        return Ok((replies::ask_goal(), DialogueState::None));
    };
    let canonical = goals::canonical_goal_type(goal_type);
    goals::set(&state.db, user.id, &canonical, target).await?;
    Ok((replies::goal_set(goal_type, target), DialogueState::None))
}

async fn list_goals(state: &AppState, user: &User) -> anyhow::Result<(String, DialogueState)> {
    let calorie = goals::get(&state.db, user.id, goals::CALORIE_INTAKE).await?;
    let weight_goal = goals::get(&state.db, user.id, goals::WEIGHT_LOSS).await?;
    let exercise_goal = goals::get(&state.db, user.id, goals::EXERCISE_FREQUENCY).await?;
    let current_weight = weight::latest(&state.db, user.id).await?;
    Ok((
        replies::goals_list(
            calorie.as_ref(),
            weight_goal.as_ref(),
            exercise_goal.as_ref(),
            current_weight,
        ),
        DialogueState::None,
    ))
}

async fn set_reminder(
    state: &AppState,
    user: &User,
    e: &Entities,
) -> anyhow::Result<(String, DialogueState)> {
    let Some(text) = e.reminder_texts.first() else {
        return Ok((replies::ask_reminder(), DialogueState::None));
    };
    match &e.time {
        Some(TimeField::Parsed(hh_mm)) => {
            let set = reminders::service::set_reminder(
                &state.db,
                &state.scheduler,
                user.id,
                &user.whatsapp_number,
                text,
                hh_mm,
            )
            .await?;
            let reply = match set {
                Some(reminder) => {
                    replies::reminder_set(&reminder.reminder_text, &reminder.reminder_time)
                }
                None => replies::invalid_time(),
            };
            Ok((reply, DialogueState::None))
        }
        // An unparsed time is invalid for scheduling, never accepted silently.
        Some(TimeField::Unparsed(_)) => Ok((replies::invalid_time(), DialogueState::None)),
        None => Ok((replies::ask_reminder(), DialogueState::None)),
    }
}

async fn list_reminders(state: &AppState, user: &User) -> anyhow::Result<(String, DialogueState)> {
    let reminders = reminders::repo::list_active_for_user(&state.db, user.id).await?;
    let reply = if reminders.is_empty() {
        replies::no_reminders()
    } else {
        replies::reminders_list(&reminders)
    };
    Ok((reply, DialogueState::None))
}

async fn cancel_reminder(
    state: &AppState,
    user: &User,
    e: &Entities,
) -> anyhow::Result<(String, DialogueState)> {
    let (Some(text), Some(TimeField::Parsed(hh_mm))) = (e.reminder_texts.first(), &e.time) else {
        return Ok((replies::ask_reminder(), DialogueState::None));
    };
    let cancelled =
        reminders::service::cancel_reminder(&state.db, &state.scheduler, user.id, text, hh_mm)
            .await?;
    let reply = if cancelled > 0 {
        replies::reminder_cancelled(text, hh_mm)
    } else {
        replies::reminder_not_found()
    };
    Ok((reply, DialogueState::None))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::config::{AppConfig, TwilioConfig, WitConfig};
    use crate::dialogue::store::testing::MemoryStateStore;
    use crate::dialogue::store::StateStore;
    use crate::meals::ledger::testing::MemoryMealLedger;
    use crate::meals::ledger::MealLedger;
    use crate::nlp::IntentClassifier;
    use crate::nutrition::repo::testing::MemoryFoodTable;
    use crate::outbound::MessageSender;
    use crate::reminders::scheduler::ReminderScheduler;
    use crate::users::testing::MemoryUserDirectory;

    const NUMBER: &str = "whatsapp:+5511999990000";

    /// Returns one canned payload per call, then empty classifications.
    struct ScriptedClassifier {
        script: Mutex<VecDeque<ClassifierResponse>>,
    }

    impl ScriptedClassifier {
        fn new(script: Vec<ClassifierResponse>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl IntentClassifier for ScriptedClassifier {
        async fn classify(&self, _text: &str) -> anyhow::Result<ClassifierResponse> {
            Ok(self
                .script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_default())
        }
    }

    struct DownClassifier;

    #[async_trait]
    impl IntentClassifier for DownClassifier {
        async fn classify(&self, _text: &str) -> anyhow::Result<ClassifierResponse> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    struct SilentSender;

    #[async_trait]
    impl MessageSender for SilentSender {
        async fn send(&self, _to: &str, _body: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct NoScheduler;

    #[async_trait]
    impl ReminderScheduler for NoScheduler {
        async fn schedule(
            &self,
            _job_id: &str,
            _hh_mm: &str,
            _to: &str,
            _body: &str,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        async fn cancel(&self, _job_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            database_url: "postgres://localhost/unused".into(),
            wit: WitConfig {
                token: "test".into(),
                api_url: "http://localhost/message".into(),
                api_version: "20240501".into(),
            },
            twilio: TwilioConfig {
                account_sid: "AC0".into(),
                auth_token: "test".into(),
                from_number: "whatsapp:+10000000000".into(),
            },
            intent_confidence_threshold: 0.7,
            reply_budget: 1500,
            greeting_time: "08:00".into(),
        })
    }

    fn harness(
        classifier: Arc<dyn IntentClassifier>,
        calorie_target: Option<f64>,
    ) -> (AppState, Arc<MemoryStateStore>, Arc<MemoryMealLedger>) {
        let states = Arc::new(MemoryStateStore::default());
        let ledger = Arc::new(MemoryMealLedger::with_target(calorie_target));
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool");
        let state = AppState::from_parts(
            db,
            test_config(),
            classifier,
            Arc::new(MemoryFoodTable::taco_sample()),
            states.clone(),
            Arc::new(MemoryUserDirectory::default()),
            ledger.clone(),
            Arc::new(SilentSender),
            Arc::new(NoScheduler),
        );
        (state, states, ledger)
    }

    fn meal_payload(product: &str) -> ClassifierResponse {
        serde_json::from_value(json!({
            "intents": [{ "name": "registrar_refeicao", "confidence": 0.96 }],
            "entities": {
                "wit$quantity:quantity": [{
                    "value": 100,
                    "unit": "gram",
                    "product": product,
                    "body": format!("100g de {product}")
                }]
            }
        }))
        .expect("classifier payload")
    }

    fn resolved(name: &str, kcal: f64) -> ResolvedFood {
        ResolvedFood {
            source_name: name.into(),
            description: name.into(),
            grams: 100.0,
            kcal,
            protein_g: 2.6,
            fat_g: 1.0,
            carb_g: 25.8,
        }
    }

    #[tokio::test]
    async fn meal_message_opens_confirmation_without_best_guess_in_alternatives() {
        let classifier = Arc::new(ScriptedClassifier::new(vec![meal_payload("arroz")]));
        let (state, states, ledger) = harness(classifier, None);

        let reply = process_message(&state, NUMBER, "Comi 100g de arroz")
            .await
            .expect("reply");
        assert!(reply.contains("Encontrei: Arroz, integral, cozido"));
        assert!(reply.contains("sim/não"));
        assert!(ledger.entries().is_empty());

        let user = state.users.resolve(NUMBER).await.expect("user");
        match states.get(user.id).await.expect("state") {
            DialogueState::AwaitingMealConfirmation {
                best_guess,
                alternatives,
            } => {
                assert_eq!(best_guess.source_name, "Arroz, integral, cozido");
                assert!(!alternatives.is_empty());
                assert!(alternatives
                    .iter()
                    .all(|a| a.source_name != best_guess.source_name));
            }
            other => panic!("expected confirmation state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_best_guess_lists_only_the_other_options() {
        let classifier = Arc::new(ScriptedClassifier::new(vec![meal_payload("arroz")]));
        let (state, states, _ledger) = harness(classifier, None);

        process_message(&state, NUMBER, "Comi 100g de arroz")
            .await
            .expect("first reply");
        let reply = process_message(&state, NUMBER, "não").await.expect("reply");

        assert!(reply.contains("1. Arroz, tipo 1, cozido"));
        assert!(!reply.contains("integral"));

        let user = state.users.resolve(NUMBER).await.expect("user");
        match states.get(user.id).await.expect("state") {
            DialogueState::AwaitingAlternativeSelection { options } => {
                assert_eq!(options.len(), 1);
            }
            other => panic!("expected selection state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn affirmative_reply_commits_even_with_the_classifier_down() {
        let (state, states, ledger) = harness(Arc::new(DownClassifier), Some(2000.0));
        let user = state.users.resolve(NUMBER).await.expect("user");
        states
            .set(
                user.id,
                &DialogueState::AwaitingMealConfirmation {
                    best_guess: resolved("Arroz, integral, cozido", 124.0),
                    alternatives: vec![],
                },
            )
            .await
            .expect("seed state");

        let reply = process_message(&state, NUMBER, "sim").await.expect("reply");

        assert!(reply.contains("Refeição registrada: Arroz, integral, cozido"));
        assert!(reply.contains("1876"));
        let entries = ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "Arroz, integral, cozido");
        assert!((entries[0].kcal - 124.0).abs() < 1e-9);
        assert_eq!(states.get(user.id).await.expect("state"), DialogueState::None);
    }

    #[tokio::test]
    async fn new_meal_command_discards_pending_confirmation() {
        let classifier = Arc::new(ScriptedClassifier::new(vec![meal_payload("feijão")]));
        let (state, states, ledger) = harness(classifier, None);
        let user = state.users.resolve(NUMBER).await.expect("user");
        states
            .set(
                user.id,
                &DialogueState::AwaitingMealConfirmation {
                    best_guess: resolved("Arroz, integral, cozido", 124.0),
                    alternatives: vec![],
                },
            )
            .await
            .expect("seed state");

        let reply = process_message(&state, NUMBER, "Comi 100g de feijão")
            .await
            .expect("reply");

        assert!(reply.contains("Encontrei: Feijão"));
        assert!(ledger.entries().is_empty());
        match states.get(user.id).await.expect("state") {
            DialogueState::AwaitingMealConfirmation { best_guess, .. } => {
                assert!(best_guess.source_name.starts_with("Feijão"));
            }
            other => panic!("expected a fresh confirmation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_number_removes_the_chosen_entry() {
        let (state, states, ledger) = harness(Arc::new(DownClassifier), None);
        let user = state.users.resolve(NUMBER).await.expect("user");
        let entry = ledger
            .add(user.id, &resolved("Arroz, integral, cozido", 124.0))
            .await
            .expect("seed entry");
        states
            .set(
                user.id,
                &DialogueState::AwaitingDeleteNumber {
                    entries: BTreeMap::from([("1".to_string(), entry.id)]),
                },
            )
            .await
            .expect("seed state");

        let reply = process_message(&state, NUMBER, "1").await.expect("reply");

        assert!(reply.contains("Refeição apagada"));
        assert!(ledger.entries().is_empty());
        assert_eq!(states.get(user.id).await.expect("state"), DialogueState::None);
    }

    #[tokio::test]
    async fn unrecognized_message_without_pending_dialogue_gets_help() {
        let (state, _states, ledger) = harness(Arc::new(DownClassifier), None);
        let reply = process_message(&state, NUMBER, "blablabla").await.expect("reply");
        assert!(reply.contains("não entendi o que você quis dizer"));
        assert!(ledger.entries().is_empty());
    }
}
