//! Administrator configuration loaded from environment variables.
//!
//! `ADMIN_USER_IDS` holds a comma-separated list of Discord user IDs. Users in the
//! list are registered with the ADMIN role.

use std::collections::HashSet;

/// Parses a comma-separated id list, ignoring blanks and surrounding whitespace.
#[must_use]
pub fn parse_admin_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Gets the configured administrator Discord ids.
///
/// # Returns
///
/// An empty set when `ADMIN_USER_IDS` is not configured.
#[must_use]
pub fn get_admin_ids() -> HashSet<String> {
    std::env::var("ADMIN_USER_IDS")
        .map(|raw| parse_admin_ids(&raw))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids_trims_and_skips_blanks() {
        let ids = parse_admin_ids(" 111 ,222,, ,333");
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("111"));
        assert!(ids.contains("333"));
    }

    #[test]
    fn test_parse_admin_ids_empty() {
        assert!(parse_admin_ids("").is_empty());
    }
}
