// SPDX-License-Identifier: MIT OR Apache-2.0
//! Capability sets over the per-subject token vocabularies.

use std::collections::HashSet;

use drover_policy::capability;

/// A set of capability tokens attached to one compiled target.
///
/// Merging is pure set union; the deny-dominance rule lives entirely in
/// [`check`](CapabilitySet::check). A set that contains `deny` therefore
/// fails every check no matter what else was unioned into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    caps: HashSet<String>,
}

impl CapabilitySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `capability`.
    pub fn set(&mut self, capability: &str) {
        self.caps.insert(capability.to_string());
    }

    /// `true` iff `capability` is present and `deny` is not.
    #[must_use]
    pub fn check(&self, capability: &str) -> bool {
        self.caps.contains(capability) && !self.caps.contains(capability::DENY)
    }

    /// Remove every capability.
    pub fn clear(&mut self) {
        self.caps.clear();
    }

    /// Union `other` into `self`.
    pub fn merge(&mut self, other: &CapabilitySet) {
        for cap in &other.caps {
            self.caps.insert(cap.clone());
        }
    }

    /// `true` when the set contains `deny`.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        self.caps.contains(capability::DENY)
    }

    /// `true` when at least one capability is usable: the set is non-empty
    /// and not deny-dominated. This is the "should the target be visible"
    /// test.
    #[must_use]
    pub fn allows_any(&self) -> bool {
        !self.is_denied() && !self.caps.is_empty()
    }

    /// Number of tokens, deny included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.caps.len()
    }

    /// `true` when no tokens are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for cap in iter {
            set.set(cap.as_ref());
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::CapabilitySet;

    #[test]
    fn set_check_clear() {
        let mut cs = CapabilitySet::new();
        assert!(!cs.check("read-job"));

        cs.set("read-job");
        assert!(cs.check("read-job"));
        assert!(!cs.check("submit-job"));

        cs.clear();
        assert!(!cs.check("read-job"));
        assert!(cs.is_empty());
    }

    #[test]
    fn deny_shadows_everything_in_check() {
        let mut cs: CapabilitySet = ["read-job", "submit-job"].into_iter().collect();
        assert!(cs.check("read-job"));

        cs.set("deny");
        assert!(!cs.check("read-job"));
        assert!(!cs.check("submit-job"));
        assert!(!cs.check("deny"));
        assert!(cs.is_denied());
    }

    #[test]
    fn merge_is_union() {
        let mut a: CapabilitySet = ["list-jobs"].into_iter().collect();
        let b: CapabilitySet = ["list-jobs", "read-job"].into_iter().collect();

        a.merge(&b);
        assert_eq!(a.len(), 2);
        assert!(a.check("list-jobs"));
        assert!(a.check("read-job"));
    }

    #[test]
    fn merge_carries_deny_across() {
        let mut a: CapabilitySet = ["read-job"].into_iter().collect();
        let b: CapabilitySet = ["deny"].into_iter().collect();

        a.merge(&b);
        assert!(!a.check("read-job"));
        assert!(a.is_denied());
    }

    #[test]
    fn allows_any_ignores_lone_deny() {
        let empty = CapabilitySet::new();
        assert!(!empty.allows_any());

        let denied: CapabilitySet = ["deny"].into_iter().collect();
        assert!(!denied.allows_any());

        let denied_with_grants: CapabilitySet = ["deny", "read-job"].into_iter().collect();
        assert!(!denied_with_grants.allows_any());

        let granted: CapabilitySet = ["list-jobs"].into_iter().collect();
        assert!(granted.allows_any());
    }
}
