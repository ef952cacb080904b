// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for `drover-glob` using proptest.

use drover_glob::{WildcardIndex, is_wildcard, matches, specificity};
use proptest::prelude::*;

/// Strategy producing NUL-free, star-free names (the shape of real ACL
/// targets: namespaces, volumes, variable paths).
fn target_name() -> impl Strategy<Value = String> {
    "[a-z0-9]([a-z0-9/_-]{0,18})".prop_map(|s| s.to_string())
}

/// Strategy producing a short NUL-free, star-free fragment.
fn fragment() -> impl Strategy<Value = String> {
    "[a-z0-9-]{0,8}".prop_map(|s| s.to_string())
}

// ── 1. A star-free pattern matches exactly itself ───────────────────

proptest! {
    #[test]
    fn literal_pattern_matches_only_itself(name in target_name(), other in target_name()) {
        prop_assert!(matches(&name, &name));
        if name != other {
            prop_assert!(!matches(&name, &other));
        }
    }
}

// ── 2. A lone star matches any NUL-free name ────────────────────────

proptest! {
    #[test]
    fn lone_star_matches_everything(name in target_name()) {
        prop_assert!(matches("*", &name));
    }
}

// ── 3. Prefix and suffix globs ──────────────────────────────────────

proptest! {
    #[test]
    fn prefix_glob_matches_extensions(prefix in fragment(), suffix in fragment()) {
        let pattern = format!("{prefix}*");
        let name = format!("{prefix}{suffix}");
        prop_assert!(matches(&pattern, &name));
    }

    #[test]
    fn suffix_glob_matches_extensions(prefix in fragment(), suffix in fragment()) {
        let pattern = format!("*{suffix}");
        let name = format!("{prefix}{suffix}");
        prop_assert!(matches(&pattern, &name));
    }
}

// ── 4. A star never crosses a NUL byte ──────────────────────────────

proptest! {
    #[test]
    fn star_stops_at_nul(left in fragment(), right in fragment()) {
        let name = format!("{left}\0{right}");
        prop_assert!(!matches("*", &name));
        let left_star = format!("{}*", left);
        prop_assert!(!matches(&left_star, &name));
    }
}

// ── 5. Specificity follows the frozen formula ───────────────────────

proptest! {
    #[test]
    fn specificity_is_name_len_minus_literal_bytes(prefix in fragment(), suffix in fragment()) {
        let pattern = format!("{prefix}*");
        let name = format!("{prefix}{suffix}");
        prop_assert!(matches(&pattern, &name));
        prop_assert_eq!(specificity(&pattern, &name), suffix.len());
    }
}

// ── 6. Index results agree with the free functions ──────────────────

proptest! {
    #[test]
    fn index_agrees_with_matcher(name in target_name(), prefix in fragment()) {
        let pattern = format!("{prefix}*");
        let mut index = WildcardIndex::new();
        index.insert(pattern.clone(), ());

        let found = index.find_all_matching(&name);
        if matches(&pattern, &name) {
            prop_assert_eq!(found.len(), 1);
            prop_assert_eq!(found[0].specificity, specificity(&pattern, &name));
        } else {
            prop_assert!(found.is_empty());
        }
    }
}

// ── 7. Wildcard classification is purely syntactic ──────────────────

proptest! {
    #[test]
    fn star_free_names_are_exact_targets(name in target_name()) {
        prop_assert!(!is_wildcard(&name));
        let name_star = format!("{}*", name);
        prop_assert!(is_wildcard(&name_star));
    }
}
