use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

pub const LIKE_ESCAPE: char = '\\';

/// Accent- and case-insensitive form of a display name, stored next to the
/// original in `*_unaccent` columns and used for search.
pub fn fold(value: &str) -> String {
    value
        .trim()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// `LIKE` pattern matching any folded value that contains `term`.
pub fn contains_pattern(term: &str) -> String {
    let folded = fold(term);
    let mut pattern = String::with_capacity(folded.len() + 2);
    pattern.push('%');
    for c in folded.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::{contains_pattern, fold};

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(fold("Laboratório 1"), "laboratorio 1");
        assert_eq!(fold("  João Conceição "), "joao conceicao");
        assert_eq!(fold("ÁÉÍÓÚ ãõ ç"), "aeiou ao c");
    }

    #[test]
    fn leaves_plain_ascii_lowercased() {
        assert_eq!(fold("TOCA"), "toca");
    }

    #[test]
    fn pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Sala"), "%sala%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
