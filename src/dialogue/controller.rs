use std::collections::BTreeMap;

use crate::nlp::Intent;
use crate::nutrition::ResolvedFood;

use super::state::DialogueState;

const AFFIRMATIVE: &[&str] = &["sim", "s", "ok", "correto", "isso"];
const NEGATIVE: &[&str] = &["não", "nao", "n", "errado", "outro"];
const CANCEL: &[&str] = &["cancela", "cancelar"];

/// What the controller decided for one inbound reply. The caller performs
/// the side effects and persists the next state.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogueOutcome {
    /// No pending dialogue; route by intent.
    PassThrough,
    /// A pending dialogue exists but the new message carries an explicit
    /// command; the pending state is discarded before routing.
    Interrupted,
    /// Confirmed option to write as a meal entry. Next state: none.
    CommitMeal(ResolvedFood),
    /// Best guess rejected and alternatives exist: present the numbered list.
    OfferAlternatives {
        options: BTreeMap<String, ResolvedFood>,
    },
    /// Best guess rejected with nothing else to offer. Next state: none.
    NothingToOffer,
    /// Unrecognized reply: keep the state untouched and ask again.
    Reprompt(DialogueState),
    /// Selection dialogue cancelled by the user. Next state: none.
    Cancelled,
    /// Confirmed day-entry deletion. Next state: none.
    DeleteEntry(i64),
}

/// Advances the per-user state machine for one message. Total: every
/// (state, input-class) pair maps to a defined outcome, and an unrecognized
/// reply never mutates anything.
pub fn advance(state: DialogueState, intent: Intent, reply: &str) -> DialogueOutcome {
    if !state.is_none() && intent.interrupts() {
        return DialogueOutcome::Interrupted;
    }

    let token = reply.trim().to_lowercase();
    match state {
        DialogueState::None => DialogueOutcome::PassThrough,

        DialogueState::AwaitingMealConfirmation {
            best_guess,
            alternatives,
        } => {
            if AFFIRMATIVE.contains(&token.as_str()) {
                DialogueOutcome::CommitMeal(best_guess)
            } else if NEGATIVE.contains(&token.as_str()) {
                if alternatives.is_empty() {
                    DialogueOutcome::NothingToOffer
                } else {
                    DialogueOutcome::OfferAlternatives {
                        options: number_options(&alternatives),
                    }
                }
            } else {
                DialogueOutcome::Reprompt(DialogueState::AwaitingMealConfirmation {
                    best_guess,
                    alternatives,
                })
            }
        }

        DialogueState::AwaitingAlternativeSelection { options } => {
            if CANCEL.contains(&token.as_str()) {
                DialogueOutcome::Cancelled
            } else if let Some(choice) = selection_key(&token).and_then(|k| options.get(&k)) {
                DialogueOutcome::CommitMeal(choice.clone())
            } else {
                DialogueOutcome::Reprompt(DialogueState::AwaitingAlternativeSelection { options })
            }
        }

        DialogueState::AwaitingDeleteNumber { entries } => {
            if let Some(id) = selection_key(&token).and_then(|k| entries.get(&k).copied()) {
                DialogueOutcome::DeleteEntry(id)
            } else {
                DialogueOutcome::Reprompt(DialogueState::AwaitingDeleteNumber { entries })
            }
        }
    }
}

pub fn number_options(alternatives: &[ResolvedFood]) -> BTreeMap<String, ResolvedFood> {
    alternatives
        .iter()
        .enumerate()
        .map(|(i, option)| ((i + 1).to_string(), option.clone()))
        .collect()
}

/// Normalizes a numeric reply ("2", " 02 ") to its map key.
fn selection_key(token: &str) -> Option<String> {
    token.parse::<u32>().ok().map(|n| n.to_string())
}
