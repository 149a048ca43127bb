/// Lowercases, folds Portuguese diacritics to ASCII and strips everything
/// outside `[a-z0-9 ,]`. Idempotent.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        let folded = match c {
            'á' | 'à' | 'ã' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'õ' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        };
        if matches!(folded, 'a'..='z' | '0'..='9' | ' ' | ',') {
            out.push(folded);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_diacritics_and_case() {
        assert_eq!(normalize("Feijão, Preto"), "feijao, preto");
        assert_eq!(normalize("Açaí"), "acai");
        assert_eq!(normalize("CONTRAFILÉ"), "contrafile");
    }

    #[test]
    fn strips_outside_charset() {
        assert_eq!(normalize("arroz (cozido)! 100%"), "arroz cozido 100");
    }

    #[test]
    fn idempotent() {
        for s in ["Feijão, preto, cozido", "100g de arroz", "Açaí c/ granola", ""] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }
}
