// SPDX-License-Identifier: MIT OR Apache-2.0
//! Build-time policy errors.
//!
//! Validation failures carry the offending policy's name (which may be
//! blank when the source document was anonymous) and enough context to
//! point at the rule. Query evaluation never produces errors; ill-formed
//! query inputs deterministically deny.

use thiserror::Error;

use crate::PolicyLevel;

/// A structural problem in a policy document, detected before compilation.
///
/// No partial ACL is ever produced: the first error aborts the build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A rule lists a capability outside its subject's vocabulary.
    #[error("policy {policy:?}: {subject} {target:?}: unknown capability {capability:?}")]
    UnknownCapability {
        /// Name of the offending policy.
        policy: String,
        /// Subject category of the rule (`namespace`, `host_volume`, ...).
        subject: &'static str,
        /// The rule's target name or pattern.
        target: String,
        /// The capability that is not in the vocabulary.
        capability: String,
    },

    /// A rule uses a policy alias its subject does not accept.
    #[error("policy {policy:?}: {subject} {target:?}: policy alias {level} is not valid here")]
    InvalidAlias {
        /// Name of the offending policy.
        policy: String,
        /// Subject category of the rule.
        subject: &'static str,
        /// The rule's target name or pattern.
        target: String,
        /// The rejected alias.
        level: PolicyLevel,
    },

    /// A coarse block (agent, node, operator, quota, plugin) uses an alias
    /// outside its accepted set.
    #[error("policy {policy:?}: {subject} block: policy alias {level} is not valid here")]
    InvalidCoarseAlias {
        /// Name of the offending policy.
        policy: String,
        /// Subject category of the block.
        subject: &'static str,
        /// The rejected alias.
        level: PolicyLevel,
    },

    /// A rule's target name or pattern is unusable: blank, longer than the
    /// target limit, or containing a NUL byte.
    #[error("policy {policy:?}: {subject} target {target:?}: {reason}")]
    InvalidTarget {
        /// Name of the offending policy.
        policy: String,
        /// Subject category of the rule.
        subject: &'static str,
        /// The offending target, as written.
        target: String,
        /// Why the target was rejected.
        reason: String,
    },
}
