use super::codes::FULL_DEMO;

/// True if `required` is granted directly or through the `full_demo` wildcard.
#[must_use]
pub fn has_permission<S: AsRef<str>>(permissions: &[S], required: &str) -> bool {
    permissions
        .iter()
        .any(|p| p.as_ref() == required || p.as_ref() == FULL_DEMO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_demo_is_a_wildcard() {
        assert!(has_permission(&["full_demo"], "anything"));
        assert!(has_permission(&["beta_features", "full_demo"], "universe_management"));
    }

    #[test]
    fn exact_match_is_required_otherwise() {
        assert!(!has_permission(&["basic_demo"], "beta_features"));
        assert!(has_permission(&["basic_demo"], "basic_demo"));
        assert!(!has_permission(&["Basic_Demo"], "basic_demo"));
    }

    #[test]
    fn empty_permissions_grant_nothing() {
        let none: [&str; 0] = [];
        assert!(!has_permission(&none, "basic_demo"));
        assert!(!has_permission(&Vec::<String>::new(), FULL_DEMO));
    }
}
