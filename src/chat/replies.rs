//! Reply text builders. Everything the bot says lives here, in the bot's
//! locale, so the orchestration code stays free of string formatting.

use std::collections::BTreeMap;

use crate::meals::{DayTotals, MealEntry};
use crate::nutrition::ResolvedFood;
use crate::reminders::Reminder;
use crate::tracking::exercise::ExerciseEntry;
use crate::tracking::goals::Goal;

pub fn help() -> String {
    "Desculpe, não entendi o que você quis dizer. Tente um dos comandos: \
     registrar peso, comi [alimento], fiz exercício, resumo diário, minhas refeições, \
     apagar refeição, definir meta, definir lembrete, meus lembretes."
        .to_string()
}

pub fn greeting() -> String {
    "Olá! Eu sou seu assistente de saúde. Como posso te ajudar hoje?".to_string()
}

pub fn good_morning() -> String {
    "☀️ Bom dia! Pronto para o dia? Me diga como posso te ajudar hoje.".to_string()
}

pub fn try_again() -> String {
    "Tive um problema ao processar sua mensagem. Tente novamente em instantes.".to_string()
}

// --- meals ---

pub fn restate_meal() -> String {
    "Não consegui identificar o que você comeu. Por favor, diga \
     (ex: 'Comi 100g de arroz e frango')."
        .to_string()
}

pub fn no_nutrition_data(query: &str) -> String {
    format!("Não encontrei dados nutricionais para '{query}'.")
}

fn macros_line(kcal: f64, carb: f64, protein: f64, fat: f64) -> String {
    format!("Cal: {kcal:.0} | Carb: {carb:.0} | Prot: {protein:.0} | Gord: {fat:.0}")
}

pub fn confirm_meal(food: &ResolvedFood) -> String {
    format!(
        "Encontrei: {} ({}). Está correto? (sim/não)",
        food.description,
        macros_line(food.kcal, food.carb_g, food.protein_g, food.fat_g)
    )
}

pub fn meal_logged(food: &ResolvedFood, goal_line: &str) -> String {
    format!(
        "Refeição registrada: {} ({}).\n{}",
        food.description,
        macros_line(food.kcal, food.carb_g, food.protein_g, food.fat_g),
        goal_line
    )
}

pub fn goal_feedback(target_kcal: f64, consumed_today: f64) -> String {
    let remaining = target_kcal - consumed_today;
    if remaining >= 0.0 {
        format!(
            "Você ainda pode consumir {remaining:.0} kcal hoje para atingir sua meta de {target_kcal:.0} kcal."
        )
    } else {
        format!(
            "🚨 Atenção: você já excedeu sua meta diária de {target_kcal:.0} kcal em {:.0} kcal.",
            -remaining
        )
    }
}

pub fn no_goal_hint() -> String {
    "Defina uma meta de calorias diárias para acompanhar seu consumo \
     (ex: 'Definir meta calorias 2000')."
        .to_string()
}

pub fn alternatives_list(options: &BTreeMap<String, ResolvedFood>) -> String {
    let mut lines = vec!["Essas são as outras opções que encontrei:".to_string()];
    for (key, food) in options {
        lines.push(format!(
            "{key}. {} ({})",
            food.description,
            macros_line(food.kcal, food.carb_g, food.protein_g, food.fat_g)
        ));
    }
    lines.push("Responda com o número da opção correta ou 'cancela'.".to_string());
    lines.join("\n")
}

pub fn nothing_else() -> String {
    "Não encontrei outras opções. Tente descrever o alimento de outra forma.".to_string()
}

pub fn cancelled() -> String {
    "Ok, cancelado.".to_string()
}

pub fn reprompt_confirmation(best_guess: &ResolvedFood) -> String {
    format!(
        "Não entendi. Encontrei: {}. Responda 'sim' se estiver correto ou 'não' para ver outras opções.",
        best_guess.description
    )
}

pub fn reprompt_selection() -> String {
    "Não entendi. Responda com o número de uma das opções ou 'cancela'.".to_string()
}

pub fn reprompt_delete() -> String {
    "Não entendi. Responda com o número da refeição que deseja apagar.".to_string()
}

pub fn meal_deleted() -> String {
    "Refeição apagada.".to_string()
}

pub fn meal_already_gone() -> String {
    "Essa refeição já não existe mais.".to_string()
}

pub fn no_meals_today() -> String {
    "Você ainda não registrou nenhuma refeição hoje. Use 'comi [alimento]' para registrar."
        .to_string()
}

pub fn meals_list(entries: &[MealEntry], totals: &DayTotals) -> String {
    let mut lines = vec!["Suas refeições de hoje:".to_string()];
    for e in entries {
        lines.push(format!(
            "- {} ({})",
            e.description,
            macros_line(e.kcal, e.carb_g, e.protein_g, e.fat_g)
        ));
    }
    lines.push(format!(
        "\nTotal de hoje: {:.0} kcal, {:.0}g Carb, {:.0}g Prot, {:.0}g Gord.",
        totals.kcal, totals.carb_g, totals.protein_g, totals.fat_g
    ));
    lines.join("\n")
}

pub fn delete_prompt(entries: &[MealEntry]) -> String {
    let mut lines = vec!["Qual refeição você quer apagar?".to_string()];
    for (i, e) in entries.iter().enumerate() {
        lines.push(format!("{}. {} ({:.0} kcal)", i + 1, e.description, e.kcal));
    }
    lines.push("Responda com o número.".to_string());
    lines.join("\n")
}

// --- weight / exercise ---

pub fn weight_logged(weight_kg: f64) -> String {
    format!("Peso de {weight_kg} kg registrado com sucesso!")
}

pub fn ask_weight() -> String {
    "Não consegui encontrar o valor do peso. Diga seu peso (ex: 'Meu peso é 75.5').".to_string()
}

pub fn exercise_logged(activity: &str, minutes: f64, kcal: f64) -> String {
    format!(
        "Registrado: {activity} por {minutes:.0} minutos. Calorias queimadas estimadas: {kcal:.2}."
    )
}

pub fn exercise_unknown(activity: &str) -> String {
    format!("Não consegui estimar as calorias para '{activity}'. Tente um exercício mais comum.")
}

pub fn ask_exercise() -> String {
    "Não consegui identificar o exercício ou a duração. Use 'Fiz [exercício] por [tempo]' \
     (ex: 'Fiz corrida por 30 minutos')."
        .to_string()
}

pub fn daily_summary(
    meals: &[MealEntry],
    totals: &DayTotals,
    exercises: &[ExerciseEntry],
    last_weight: Option<f64>,
) -> String {
    let mut lines = vec![format!("--- Alimentação ({:.0} kcal) ---", totals.kcal)];
    if meals.is_empty() {
        lines.push("Nenhum alimento registrado.".to_string());
    } else {
        for e in meals {
            lines.push(format!(
                "- {} ({})",
                e.description,
                macros_line(e.kcal, e.carb_g, e.protein_g, e.fat_g)
            ));
        }
        lines.push(format!(
            "(Total Carb: {:.0}g | Prot: {:.0}g | Gord: {:.0}g)",
            totals.carb_g, totals.protein_g, totals.fat_g
        ));
    }

    let burned: f64 = exercises.iter().map(|e| e.kcal_burned).sum();
    lines.push(format!("\n--- Exercícios ({burned:.0} kcal queimadas) ---"));
    if exercises.is_empty() {
        lines.push("Nenhum exercício registrado.".to_string());
    } else {
        for e in exercises {
            lines.push(format!(
                "- {} por {} min ({:.2} kcal)",
                e.activity_name, e.duration_minutes, e.kcal_burned
            ));
        }
    }

    lines.push(match last_weight {
        Some(w) => format!("\nSeu último peso registrado: {w:.1} kg"),
        None => "\nNenhum peso registrado.".to_string(),
    });
    lines.push(format!(
        "Balanço calórico estimado: {:.0} kcal (consumidas - queimadas)",
        totals.kcal - burned
    ));
    lines.join("\n")
}

// --- goals ---

pub fn goal_set(goal_type: &str, target_value: f64) -> String {
    format!("Meta de {goal_type} definida para {target_value} com sucesso!")
}

pub fn ask_goal() -> String {
    "Não consegui definir a meta. Use 'Definir meta [tipo] [valor]' \
     (ex: 'Definir meta calorias 2000')."
        .to_string()
}

pub fn goals_list(
    calorie: Option<&Goal>,
    weight: Option<&Goal>,
    exercise: Option<&Goal>,
    current_weight: Option<f64>,
) -> String {
    let mut lines = vec!["Suas metas:".to_string()];
    if let Some(g) = calorie {
        lines.push(format!("- Consumo diário de calorias: {:.0} kcal", g.target_value));
    }
    if let Some(g) = weight {
        lines.push(format!("- Peso alvo: {:.1} kg", g.target_value));
    }
    if let Some(g) = exercise {
        lines.push(format!(
            "- Frequência de exercícios: {:.0} vezes por semana",
            g.target_value
        ));
    }
    if lines.len() == 1 {
        lines.push("Você ainda não definiu nenhuma meta. Use 'definir meta [tipo] [valor]'.".to_string());
    }
    if let (Some(goal), Some(current)) = (weight, current_weight) {
        if current <= goal.target_value {
            lines.push(format!(
                "🎉 Parabéns! Você atingiu sua meta de peso de {:.1} kg!",
                goal.target_value
            ));
        } else {
            lines.push(format!(
                "Seu peso atual é {:.1} kg. Faltam {:.1} kg para sua meta de {:.1} kg.",
                current,
                current - goal.target_value,
                goal.target_value
            ));
        }
    }
    lines.join("\n")
}

// --- reminders ---

pub fn reminder_set(text: &str, hh_mm: &str) -> String {
    format!("Lembrete '{text}' definido para as {hh_mm} com sucesso!")
}

pub fn invalid_time() -> String {
    "Não consegui entender a hora do lembrete. Use o formato HH:MM \
     (ex: 'Definir lembrete beber água 10:00')."
        .to_string()
}

pub fn ask_reminder() -> String {
    "Não consegui identificar o texto ou a hora do lembrete. \
     Use 'Definir lembrete [texto] [HH:MM]'."
        .to_string()
}

pub fn reminders_list(reminders: &[Reminder]) -> String {
    let mut lines = vec!["Seus lembretes ativos:".to_string()];
    for r in reminders {
        lines.push(format!("- '{}' às {}", r.reminder_text, r.reminder_time));
    }
    lines.push("\nPara desativar um, diga 'Desativar lembrete [texto] [HH:MM]'.".to_string());
    lines.join("\n")
}

pub fn no_reminders() -> String {
    "Você não tem lembretes ativos. Use 'definir lembrete' para criar um.".to_string()
}

pub fn reminder_cancelled(text: &str, hh_mm: &str) -> String {
    format!("Lembrete '{text}' às {hh_mm} desativado com sucesso.")
}

pub fn reminder_not_found() -> String {
    "Não encontrei esse lembrete para desativar. Verifique o texto e a hora.".to_string()
}

/// Some transports reject or truncate long messages; everything outbound
/// passes through here last.
pub fn truncate(reply: String, budget: usize) -> String {
    if reply.chars().count() <= budget {
        return reply;
    }
    let mut out: String = reply.chars().take(budget.saturating_sub(1)).collect();
    out.push('…');
    out
}
