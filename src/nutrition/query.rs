use crate::nlp::QuantityEntity;

/// Builds the ordered, de-duplicated list of candidate lookup strings for one
/// meal message. Deterministic for a given set of normalized entities.
///
/// Combined `"{value}{unit} de {product}"` forms carry portion information,
/// so after de-duplication the list is re-ordered to try multi-word,
/// quantity-bearing strings before single bare names.
pub fn build_queries(food_items: &[String], quantities: &[QuantityEntity]) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for q in quantities {
        match (&q.value, &q.unit, &q.product) {
            (Some(value), Some(unit), Some(product)) => {
                let unit = wire_unit(unit);
                candidates.push(format!("{}{} de {}", fmt_value(*value), unit, product));
                candidates.push(format!("{} {} de {}", fmt_value(*value), unit, product));
            }
            _ => {
                if let Some(raw) = &q.raw {
                    candidates.push(raw.clone());
                }
            }
        }
    }

    for q in quantities {
        if let Some(product) = &q.product {
            candidates.push(product.clone());
        }
    }
    for name in food_items {
        candidates.push(name.clone());
    }

    let mut seen: Vec<String> = Vec::new();
    let mut queries: Vec<String> = Vec::new();
    for c in candidates {
        let c = c.trim().to_string();
        if c.is_empty() {
            continue;
        }
        let key = c.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            queries.push(c);
        }
    }

    // More specific first: multi-word, quantity-bearing strings before bare
    // names, longer strings first within each class. The sort is stable, so
    // equal-length entries keep first-seen order.
    queries.sort_by_key(|q| {
        let single_word = !q.trim().contains(' ');
        (single_word, std::cmp::Reverse(q.chars().count()))
    });
    queries
}

fn fmt_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// The classifier reports builtin units in English; lookups speak the
/// reference table's locale.
fn wire_unit(unit: &str) -> &str {
    match unit.to_lowercase().as_str() {
        "gram" | "grams" | "grama" | "gramas" => "g",
        "milliliter" | "millilitre" => "ml",
        "liter" | "litre" => "litro",
        "cup" => "xicara",
        "glass" => "copo",
        _ => unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantity(value: f64, unit: &str, product: &str, raw: &str) -> QuantityEntity {
        QuantityEntity {
            value: Some(value),
            unit: Some(unit.into()),
            product: Some(product.into()),
            raw: Some(raw.into()),
        }
    }

    #[test]
    fn full_triple_yields_combined_then_bare() {
        let queries = build_queries(
            &["arroz".into()],
            &[quantity(100.0, "gram", "arroz", "100g de arroz")],
        );
        // Longer (spaced) variant first, bare name last.
        assert_eq!(queries, vec!["100 g de arroz", "100g de arroz", "arroz"]);
    }

    #[test]
    fn bare_items_without_quantities_survive() {
        let queries = build_queries(&["salada".into(), "frango".into()], &[]);
        assert_eq!(queries, vec!["salada", "frango"]);
    }

    #[test]
    fn quantity_without_value_uses_raw_phrase() {
        let q = QuantityEntity {
            value: None,
            unit: None,
            product: None,
            raw: Some("um punhado de castanhas".into()),
        };
        let queries = build_queries(&[], &[q]);
        assert_eq!(queries, vec!["um punhado de castanhas"]);
    }

    #[test]
    fn dedupe_is_case_insensitive_keeping_first_spelling() {
        let queries = build_queries(
            &["Arroz".into(), "arroz".into(), "feijão".into()],
            &[quantity(100.0, "gram", "arroz", "100g de arroz")],
        );
        // "Arroz" collapses into the first-seen spelling (the quantity's
        // product); bare names sort by descending length.
        assert_eq!(
            queries,
            vec!["100 g de arroz", "100g de arroz", "feijão", "arroz"]
        );
    }

    #[test]
    fn multi_word_queries_come_before_bare_names() {
        let queries = build_queries(
            &["ovo".into()],
            &[quantity(2.0, "glass", "suco de laranja", "2 copos de suco")],
        );
        assert!(queries[0].contains("copo de suco de laranja"));
        assert_eq!(queries.last().map(String::as_str), Some("ovo"));
    }

    #[test]
    fn deterministic_for_identical_input() {
        let foods = vec!["arroz".into(), "feijão preto".into()];
        let quants = vec![quantity(100.0, "gram", "arroz", "100g de arroz")];
        let a = build_queries(&foods, &quants);
        let b = build_queries(&foods, &quants);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_entities_yield_empty_list() {
        assert!(build_queries(&[], &[]).is_empty());
    }
}
