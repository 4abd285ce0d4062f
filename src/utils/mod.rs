//! Small helpers shared by the storefront modules.

pub mod media;
pub mod slug;
pub mod video;
pub mod whatsapp;

/// Trim an optional string, treating blank values as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Interpret a query flag: present and not `0`/`false`/empty means on.
pub fn query_flag(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") | Some("0") => false,
        Some(v) => !v.eq_ignore_ascii_case("false"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(Some("  Silk  ".into())), Some("Silk".into()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn query_flags() {
        assert!(query_flag(Some("1")));
        assert!(query_flag(Some("true")));
        assert!(query_flag(Some("yes")));
        assert!(!query_flag(Some("false")));
        assert!(!query_flag(Some("0")));
        assert!(!query_flag(Some("")));
        assert!(!query_flag(None));
    }
}
