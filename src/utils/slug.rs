/// Derive a URL slug from a display name.
///
/// Lowercases, turns spaces into `-`, then drops anything that is not an
/// ASCII letter, digit, `_` or `-`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_names() {
        assert_eq!(slugify("Banarasi Silk"), "banarasi-silk");
        assert_eq!(slugify("Kanjivaram & Zari!"), "kanjivaram--zari");
        assert_eq!(slugify("Pure_Cotton 2024"), "pure_cotton-2024");
    }

    #[test]
    fn non_ascii_is_dropped() {
        assert_eq!(slugify("Saree साड़ी"), "saree-");
        assert_eq!(slugify("!!!"), "");
    }
}
