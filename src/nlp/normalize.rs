use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::client::ClassifierResponse;

/// Classified purpose of one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    LogMeal,
    LogWeight,
    LogExercise,
    DailySummary,
    ListMeals,
    DeleteMeal,
    SetGoal,
    ListGoals,
    SetReminder,
    ListReminders,
    CancelReminder,
    Greeting,
    None,
}

impl Intent {
    pub fn from_wire(name: &str) -> Self {
        match name {
            "registrar_refeicao" => Self::LogMeal,
            "registrar_peso" => Self::LogWeight,
            "registrar_exercicio" => Self::LogExercise,
            "obter_resumo_diario" => Self::DailySummary,
            "listar_refeicoes" => Self::ListMeals,
            "apagar_refeicao" | "deletar_refeicao" => Self::DeleteMeal,
            "definir_meta" => Self::SetGoal,
            "listar_metas" => Self::ListGoals,
            "definir_lembrete" => Self::SetReminder,
            "listar_lembretes" => Self::ListReminders,
            "desativar_lembrete" => Self::CancelReminder,
            "saudacao" => Self::Greeting,
            _ => Self::None,
        }
    }

    /// An explicit command always wins over an unanswered dialogue prompt.
    pub fn interrupts(self) -> bool {
        self != Self::None
    }
}

impl Default for Intent {
    fn default() -> Self {
        Self::None
    }
}

/// A time entity, either reduced to `HH:MM` or carried through unparsed.
/// Unparsed values are invalid for scheduling and must be rejected there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeField {
    Parsed(String),
    Unparsed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantityEntity {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub product: Option<String>,
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    pub food_items: Vec<String>,
    pub quantities: Vec<QuantityEntity>,
    pub activity_names: Vec<String>,
    pub reminder_texts: Vec<String>,
    pub goal_types: Vec<String>,
    pub duration_units: Vec<String>,
    pub weight_value: Option<f64>,
    pub target_value: Option<f64>,
    pub duration_value: Option<f64>,
    pub time: Option<TimeField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub intent: Intent,
    pub entities: Entities,
}

lazy_static! {
    static ref HH_MM: Regex = Regex::new(r"^\d{2}:\d{2}$").unwrap();
}

/// Reduces a raw classifier payload to the canonical internal form. Pure;
/// a malformed or empty payload yields `Intent::None` with empty entities.
pub fn normalize_message(response: &ClassifierResponse, threshold: f64) -> NormalizedMessage {
    // Highest reported confidence wins; wire order is not trusted.
    let intent = response
        .intents
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .filter(|i| i.confidence >= threshold)
        .map(|i| Intent::from_wire(&i.name))
        .unwrap_or(Intent::None);

    let mut entities = Entities::default();
    // Quantities first: their products seed the food list ahead of plain
    // food_item mentions, independent of map iteration order.
    let ordered = response
        .entities
        .iter()
        .map(|(k, v)| (k.split(':').next().unwrap_or(k), v))
        .collect::<Vec<_>>();
    let quantities_first = ordered
        .iter()
        .filter(|(k, _)| matches!(*k, "wit$quantity" | "quantity"))
        .chain(ordered.iter().filter(|(k, _)| !matches!(*k, "wit$quantity" | "quantity")));
    for &(short, instances) in quantities_first {
        match short {
            "wit$datetime" | "datetime" => {
                if entities.time.is_none() {
                    entities.time = instances.first().map(extract_time_field);
                }
            }
            "wit$quantity" | "quantity" => {
                for item in instances {
                    let quantity = QuantityEntity {
                        value: item.get("value").and_then(value_number),
                        unit: string_field(item, "unit"),
                        product: string_field(item, "product"),
                        raw: string_field(item, "body"),
                    };
                    // A product inside a quantity is also a food mention.
                    if let Some(product) = &quantity.product {
                        push_unique(&mut entities.food_items, product);
                    }
                    entities.quantities.push(quantity);
                }
            }
            "food_item" => {
                for item in instances {
                    if let Some(v) = string_field(item, "value") {
                        push_unique(&mut entities.food_items, &v);
                    }
                }
            }
            "activity_name" => entities.activity_names = string_values(instances),
            "reminder_text" => entities.reminder_texts = string_values(instances),
            "goal_type" => entities.goal_types = string_values(instances),
            "duration_unit" => entities.duration_units = string_values(instances),
            "weight_value" => entities.weight_value = first_number(instances),
            "target_value" => entities.target_value = first_number(instances),
            "duration_value" => entities.duration_value = first_number(instances),
            _ => {}
        }
    }

    NormalizedMessage { intent, entities }
}

/// Best-effort `HH:MM` extraction: explicit sub-value, ISO-8601 time
/// component, then a full ISO-8601 parse. Anything else stays `Unparsed`.
fn extract_time_field(instance: &Value) -> TimeField {
    if let Some(values) = instance.get("values").and_then(Value::as_array) {
        for v in values {
            if v.get("type").and_then(Value::as_str) == Some("value") {
                if let Some(raw) = v.get("value").and_then(Value::as_str) {
                    if let TimeField::Parsed(t) = extract_time(raw) {
                        return TimeField::Parsed(t);
                    }
                }
            }
        }
    }
    match instance.get("value").and_then(Value::as_str) {
        Some(raw) => extract_time(raw),
        None => TimeField::Unparsed(instance.to_string()),
    }
}

pub fn extract_time(raw: &str) -> TimeField {
    if HH_MM.is_match(raw) {
        return TimeField::Parsed(raw.to_string());
    }
    if let Some((_, rest)) = raw.split_once('T') {
        let head: String = rest.chars().take(5).collect();
        if HH_MM.is_match(&head) {
            return TimeField::Parsed(head);
        }
    }
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return TimeField::Parsed(format!("{:02}:{:02}", dt.hour(), dt.minute()));
    }
    TimeField::Unparsed(raw.to_string())
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        list.push(value.to_string());
    }
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn string_values(instances: &[Value]) -> Vec<String> {
    instances
        .iter()
        .filter_map(|i| string_field(i, "value"))
        .collect()
}

fn value_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn first_number(instances: &[Value]) -> Option<f64> {
    instances
        .iter()
        .find_map(|i| i.get("value").and_then(value_number))
}
