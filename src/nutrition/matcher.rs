use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::normalize::normalize;
use super::portion::split_portion;
use super::repo::{FoodTable, NutrientRecord};
use super::scaler::{scale, ResolvedFood};

/// Upper bound on alternatives offered after a rejected best guess.
pub const ALTERNATIVES_CAP: usize = 5;

/// Builds the ranked ladder of lookup terms for one bare food name: exact
/// forms first, then wildcard-wrapped variants, then the before-the-comma
/// generic fallback. De-duplicated on normalized form (wildcards kept
/// significant) and sorted by fewer wildcards, then longer string.
pub fn lookup_terms(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let exact = raw
        .trim_end_matches(|c: char| c == ',' || c == '.' || c == '!' || c == '?')
        .trim();
    let normalized = normalize(raw).trim().to_string();

    let mut terms: Vec<String> = vec![
        exact.to_string(),
        normalized.clone(),
        format!("%{}%", raw),
        format!("%{}%", raw.replace(' ', "%")),
        format!("%{}%", normalized),
        format!("%{}%", normalized.replace(' ', "%")),
    ];
    if let Some((head, _)) = raw.split_once(',') {
        let head = head.trim();
        if !head.is_empty() && !head.eq_ignore_ascii_case(raw) {
            terms.push(format!("%{}%", head));
            terms.push(format!("%{}%", normalize(head).trim()));
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut unique: Vec<String> = Vec::new();
    for term in terms {
        let term = term.trim().to_string();
        if term.is_empty() || term.chars().all(|c| c == '%') {
            continue;
        }
        if seen.insert(term_key(&term)) {
            unique.push(term);
        }
    }

    unique.sort_by(|a, b| {
        wildcard_count(a)
            .cmp(&wildcard_count(b))
            .then(b.chars().count().cmp(&a.chars().count()))
    });
    unique
}

/// Dedupe key: normalized form with wildcards kept, so `%arroz%` stays
/// distinct from the exact term `arroz`.
fn term_key(term: &str) -> String {
    term.chars()
        .map(|c| if c == '%' { '\u{0}' } else { c })
        .collect::<String>()
        .split('\u{0}')
        .map(|chunk| normalize(chunk))
        .collect::<Vec<_>>()
        .join("%")
}

fn wildcard_count(term: &str) -> usize {
    term.chars().filter(|&c| c == '%').count()
}

/// Resolves candidate query strings against the reference table.
pub struct FoodMatcher {
    table: Arc<dyn FoodTable>,
}

impl FoodMatcher {
    pub fn new(table: Arc<dyn FoodTable>) -> Self {
        Self { table }
    }

    /// Best-guess mode: first term with a hit wins. `None` means the caller
    /// must report that no nutritional data was found, never guess.
    pub async fn best_match(&self, query: &str) -> anyhow::Result<Option<ResolvedFood>> {
        let (grams, base) = split_portion(query);
        if base.is_empty() {
            return Ok(None);
        }
        for term in lookup_terms(&base) {
            if let Some(record) = self.table.find_first(&term).await? {
                debug!(%term, food = %record.name, grams, "nutrition match");
                return Ok(Some(scale(&record, grams)));
            }
        }
        debug!(query, "no nutrition match");
        Ok(None)
    }

    /// Alternatives mode: walks the whole term ladder collecting distinct
    /// records, shorter names first among each term's hits, up to the cap.
    pub async fn alternatives(&self, query: &str) -> anyhow::Result<Vec<ResolvedFood>> {
        let (grams, base) = split_portion(query);
        if base.is_empty() {
            return Ok(Vec::new());
        }
        let mut seen: HashSet<String> = HashSet::new();
        let mut found: Vec<NutrientRecord> = Vec::new();
        for term in lookup_terms(&base) {
            if found.len() >= ALTERNATIVES_CAP {
                break;
            }
            let rows = self
                .table
                .find_matching(&term, ALTERNATIVES_CAP as i64)
                .await?;
            for record in rows {
                if found.len() >= ALTERNATIVES_CAP {
                    break;
                }
                if seen.insert(record.name.clone()) {
                    found.push(record);
                }
            }
        }
        Ok(found.iter().map(|r| scale(r, grams)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::repo::testing::MemoryFoodTable;

    fn matcher() -> FoodMatcher {
        FoodMatcher::new(Arc::new(MemoryFoodTable::taco_sample()))
    }

    #[test]
    fn exact_terms_rank_before_wildcard_terms() {
        let terms = lookup_terms("Feijão, preto");
        let first_wildcard = terms.iter().position(|t| t.contains('%')).unwrap();
        assert!(terms[..first_wildcard].iter().all(|t| !t.contains('%')));
        assert!(terms[first_wildcard..].iter().all(|t| t.contains('%')));
    }

    #[test]
    fn wildcard_variants_are_not_collapsed_into_exact_terms() {
        let terms = lookup_terms("arroz");
        assert!(terms.contains(&"arroz".to_string()));
        assert!(terms.contains(&"%arroz%".to_string()));
    }

    #[test]
    fn accent_variants_deduplicate() {
        let terms = lookup_terms("feijão");
        // "feijão" and its folded form collapse to one exact term.
        let exact: Vec<_> = terms.iter().filter(|t| !t.contains('%')).collect();
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn comma_fallback_appears_last() {
        let terms = lookup_terms("Feijão, preto, cozido");
        let generic = terms.iter().position(|t| t == "%Feijão%" || t == "%feijao%");
        assert!(generic.is_some());
        // The generic fallback is shorter, so it sorts after the full forms.
        assert!(generic.unwrap() > 0);
    }

    #[test]
    fn term_ladder_is_stable() {
        assert_eq!(lookup_terms("100g de arroz"), lookup_terms("100g de arroz"));
    }

    #[tokio::test]
    async fn best_match_scales_by_parsed_portion() {
        let food = matcher()
            .best_match("100g de arroz")
            .await
            .expect("lookup")
            .expect("match");
        assert_eq!(food.source_name, "Arroz, integral, cozido");
        assert_eq!(food.description, "Arroz, integral, cozido");
        assert_eq!(food.kcal, 124.0);
    }

    #[tokio::test]
    async fn best_match_handles_half_portions() {
        let food = matcher()
            .best_match("50g de arroz")
            .await
            .expect("lookup")
            .expect("match");
        assert!((food.kcal - 62.0).abs() < 1e-9);
        assert_eq!(food.description, "50g de Arroz, integral, cozido");
    }

    #[tokio::test]
    async fn bare_name_matches_via_wildcard_term() {
        let food = matcher()
            .best_match("feijão")
            .await
            .expect("lookup")
            .expect("match");
        assert!(food.source_name.starts_with("Feijão"));
    }

    #[tokio::test]
    async fn no_entry_yields_empty_result() {
        assert!(matcher().best_match("Contrafilé").await.expect("lookup").is_none());
        assert!(matcher().alternatives("Contrafilé").await.expect("lookup").is_empty());
    }

    #[tokio::test]
    async fn alternatives_are_distinct_and_capped() {
        let alts = matcher().alternatives("arroz").await.expect("lookup");
        assert!(!alts.is_empty());
        assert!(alts.len() <= ALTERNATIVES_CAP);
        let mut names: Vec<_> = alts.iter().map(|a| a.source_name.clone()).collect();
        names.dedup();
        assert_eq!(names.len(), alts.len());
    }

    #[tokio::test]
    async fn alternatives_ranking_is_repeatable() {
        let m = matcher();
        let a = m.alternatives("feijão").await.expect("lookup");
        let b = m.alternatives("feijão").await.expect("lookup");
        assert_eq!(a, b);
    }
}
