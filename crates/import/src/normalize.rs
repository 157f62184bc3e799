use regex::Regex;
use std::sync::OnceLock;

fn store_number() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"[0-9#]{3,}").expect("invalid regex"))
}

/// Key used to group payee names for training and classification.
///
/// Runs of three or more digits and `#` are store or transaction numbers and
/// are removed before case folding and whitespace collapsing.
pub fn normalize_name(name: &str) -> String {
    store_number()
        .replace_all(name, " ")
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_numbers_are_removed() {
        assert_eq!(normalize_name("SAFEWAY STORE 003"), "safeway store");
        assert_eq!(normalize_name("SAFEWAY #06 STORE"), "safeway store");
    }

    #[test]
    fn short_digit_runs_survive() {
        assert_eq!(normalize_name("7 ELEVEN"), "7 eleven");
        assert_eq!(normalize_name("Route 66 Diner"), "route 66 diner");
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(normalize_name("  Blue   Bottle\tCoffee "), "blue bottle coffee");
    }

    #[test]
    fn only_numbers_becomes_empty() {
        assert_eq!(normalize_name("#12345"), "");
    }
}
