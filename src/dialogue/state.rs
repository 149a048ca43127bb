use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::nutrition::ResolvedFood;

/// Per-user dialogue state, exactly one active at a time. The context is a
/// tagged union keyed by the owning state, so a payload serialized for one
/// state can never be misread by another. Must survive a JSON round trip
/// unchanged, since it crosses the request boundary through the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "context", rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    None,
    AwaitingMealConfirmation {
        best_guess: ResolvedFood,
        alternatives: Vec<ResolvedFood>,
    },
    AwaitingAlternativeSelection {
        options: BTreeMap<String, ResolvedFood>,
    },
    AwaitingDeleteNumber {
        entries: BTreeMap<String, i64>,
    },
}

impl DialogueState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::AwaitingMealConfirmation { .. } => "awaiting_meal_confirmation",
            Self::AwaitingAlternativeSelection { .. } => "awaiting_alternative_selection",
            Self::AwaitingDeleteNumber { .. } => "awaiting_delete_number",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
