// SPDX-License-Identifier: MIT OR Apache-2.0
//! Capability vocabularies and policy alias expansion, one module per
//! subject.
//!
//! Alias expansion happens once at compile time: a coarse `policy = "read"`
//! on a rule becomes the subject's read capability set, unioned with any
//! explicit `capabilities` list on the same rule.

use crate::PolicyLevel;

/// The deny capability. Shared across every subject vocabulary; its presence
/// shadows every other capability on the same target.
pub const DENY: &str = "deny";

/// Namespace capabilities and alias tables.
pub mod namespace {
    use super::{DENY, PolicyLevel};

    pub const LIST_JOBS: &str = "list-jobs";
    pub const PARSE_JOB: &str = "parse-job";
    pub const READ_JOB: &str = "read-job";
    pub const SUBMIT_JOB: &str = "submit-job";
    pub const DISPATCH_JOB: &str = "dispatch-job";
    pub const READ_LOGS: &str = "read-logs";
    pub const READ_FS: &str = "read-fs";
    pub const ALLOC_EXEC: &str = "alloc-exec";
    pub const ALLOC_LIFECYCLE: &str = "alloc-lifecycle";
    pub const ALLOC_NODE_EXEC: &str = "alloc-node-exec";
    pub const CSI_REGISTER_PLUGIN: &str = "csi-register-plugin";
    pub const CSI_LIST_VOLUME: &str = "csi-list-volume";
    pub const CSI_READ_VOLUME: &str = "csi-read-volume";
    pub const CSI_WRITE_VOLUME: &str = "csi-write-volume";
    pub const CSI_MOUNT_VOLUME: &str = "csi-mount-volume";
    pub const LIST_SCALING_POLICIES: &str = "list-scaling-policies";
    pub const READ_SCALING_POLICY: &str = "read-scaling-policy";
    pub const READ_JOB_SCALING: &str = "read-job-scaling";
    pub const SCALE_JOB: &str = "scale-job";
    pub const SUBMIT_RECOMMENDATION: &str = "submit-recommendation";

    /// Every capability a namespace rule may list explicitly.
    pub const ALL: &[&str] = &[
        DENY,
        LIST_JOBS,
        PARSE_JOB,
        READ_JOB,
        SUBMIT_JOB,
        DISPATCH_JOB,
        READ_LOGS,
        READ_FS,
        ALLOC_EXEC,
        ALLOC_LIFECYCLE,
        ALLOC_NODE_EXEC,
        CSI_REGISTER_PLUGIN,
        CSI_LIST_VOLUME,
        CSI_READ_VOLUME,
        CSI_WRITE_VOLUME,
        CSI_MOUNT_VOLUME,
        LIST_SCALING_POLICIES,
        READ_SCALING_POLICY,
        READ_JOB_SCALING,
        SCALE_JOB,
        SUBMIT_RECOMMENDATION,
    ];

    const READ_SET: &[&str] = &[
        LIST_JOBS,
        PARSE_JOB,
        READ_JOB,
        CSI_LIST_VOLUME,
        CSI_READ_VOLUME,
        LIST_SCALING_POLICIES,
        READ_SCALING_POLICY,
        READ_JOB_SCALING,
    ];

    // The write set is cumulative over the read set.
    const WRITE_SET: &[&str] = &[
        LIST_JOBS,
        PARSE_JOB,
        READ_JOB,
        CSI_LIST_VOLUME,
        CSI_READ_VOLUME,
        LIST_SCALING_POLICIES,
        READ_SCALING_POLICY,
        READ_JOB_SCALING,
        SCALE_JOB,
        SUBMIT_JOB,
        DISPATCH_JOB,
        READ_LOGS,
        READ_FS,
        ALLOC_EXEC,
        ALLOC_LIFECYCLE,
        CSI_MOUNT_VOLUME,
        CSI_WRITE_VOLUME,
        SUBMIT_RECOMMENDATION,
    ];

    const SCALE_SET: &[&str] = &[
        LIST_SCALING_POLICIES,
        READ_SCALING_POLICY,
        READ_JOB_SCALING,
        SCALE_JOB,
    ];

    /// `true` when `capability` belongs to the namespace vocabulary.
    #[must_use]
    pub fn is_valid(capability: &str) -> bool {
        ALL.contains(&capability)
    }

    /// Capability set a namespace policy alias expands to.
    #[must_use]
    pub fn expand(level: PolicyLevel) -> &'static [&'static str] {
        match level {
            PolicyLevel::Deny => &[DENY],
            PolicyLevel::Read => READ_SET,
            PolicyLevel::Write => WRITE_SET,
            PolicyLevel::Scale => SCALE_SET,
            // Rejected by validation; namespaces have no list alias.
            PolicyLevel::List => &[],
        }
    }
}

/// Host-volume capabilities and alias tables.
pub mod host_volume {
    use super::{DENY, PolicyLevel};

    pub const MOUNT_READONLY: &str = "mount-readonly";
    pub const MOUNT_READWRITE: &str = "mount-readwrite";

    /// Every capability a host-volume rule may list explicitly.
    pub const ALL: &[&str] = &[DENY, MOUNT_READONLY, MOUNT_READWRITE];

    /// `true` when `capability` belongs to the host-volume vocabulary.
    #[must_use]
    pub fn is_valid(capability: &str) -> bool {
        ALL.contains(&capability)
    }

    /// Capability set a host-volume policy alias expands to.
    #[must_use]
    pub fn expand(level: PolicyLevel) -> &'static [&'static str] {
        match level {
            PolicyLevel::Deny => &[DENY],
            PolicyLevel::Read => &[MOUNT_READONLY],
            PolicyLevel::Write => &[MOUNT_READONLY, MOUNT_READWRITE],
            // Rejected by validation.
            PolicyLevel::Scale | PolicyLevel::List => &[],
        }
    }
}

/// Variable path capabilities and the grant expansion table.
pub mod variables {
    use super::DENY;

    pub const LIST: &str = "list";
    pub const READ: &str = "read";
    pub const WRITE: &str = "write";
    pub const DESTROY: &str = "destroy";

    /// Every capability a variable path rule may list.
    pub const ALL: &[&str] = &[DENY, LIST, READ, WRITE, DESTROY];

    /// `true` when `capability` belongs to the variables vocabulary.
    #[must_use]
    pub fn is_valid(capability: &str) -> bool {
        ALL.contains(&capability)
    }

    /// What a granted capability implies: `read` implies `list`, `write`
    /// implies `read` and `list`, `destroy` stands alone.
    #[must_use]
    pub fn expand_grant(capability: &str) -> &'static [&'static str] {
        match capability {
            WRITE => &[WRITE, READ, LIST],
            READ => &[READ, LIST],
            LIST => &[LIST],
            DESTROY => &[DESTROY],
            DENY => &[DENY],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_write_is_cumulative_over_read() {
        let write = namespace::expand(PolicyLevel::Write);
        for cap in namespace::expand(PolicyLevel::Read) {
            assert!(write.contains(cap), "write set is missing {cap}");
        }
        assert!(write.contains(&namespace::SUBMIT_JOB));
        assert!(write.contains(&namespace::DISPATCH_JOB));
    }

    #[test]
    fn deny_alias_expands_to_deny_alone() {
        assert_eq!(namespace::expand(PolicyLevel::Deny), [DENY]);
        assert_eq!(host_volume::expand(PolicyLevel::Deny), [DENY]);
    }

    #[test]
    fn scale_alias_is_a_small_subset_of_write() {
        let scale = namespace::expand(PolicyLevel::Scale);
        let write = namespace::expand(PolicyLevel::Write);
        assert!(scale.len() < write.len());
        for cap in scale {
            assert!(write.contains(cap), "scale cap {cap} not in write set");
        }
    }

    #[test]
    fn every_expansion_stays_inside_the_vocabulary() {
        for level in [
            PolicyLevel::Deny,
            PolicyLevel::Read,
            PolicyLevel::Write,
            PolicyLevel::Scale,
        ] {
            for cap in namespace::expand(level) {
                assert!(namespace::is_valid(cap));
            }
            for cap in host_volume::expand(level) {
                assert!(host_volume::is_valid(cap));
            }
        }
    }

    #[test]
    fn variable_grants_expand_cumulatively() {
        assert_eq!(
            variables::expand_grant(variables::WRITE),
            [variables::WRITE, variables::READ, variables::LIST]
        );
        assert_eq!(
            variables::expand_grant(variables::READ),
            [variables::READ, variables::LIST]
        );
        assert_eq!(variables::expand_grant(variables::LIST), [variables::LIST]);
        assert_eq!(
            variables::expand_grant(variables::DESTROY),
            [variables::DESTROY]
        );
        assert_eq!(variables::expand_grant(DENY), [DENY]);
        assert!(variables::expand_grant("bogus").is_empty());
    }
}
