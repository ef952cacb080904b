// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! drover-policy
#![deny(unsafe_code)]

/// Capability vocabularies and alias expansion tables, per subject.
pub mod capability;
/// Build-time policy errors.
pub mod error;
/// Advisory policy lint warnings.
pub mod lint;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use error::PolicyError;
pub use lint::{PolicyWarning, WarningKind, lint};

/// Longest accepted target name or pattern, in bytes.
pub const MAX_TARGET_LEN: usize = 128;

// ---------------------------------------------------------------------------
// PolicyLevel
// ---------------------------------------------------------------------------

/// A coarse policy alias, expanded to a capability set at compile time.
///
/// Which aliases are legal depends on the subject: namespaces accept
/// `deny`/`read`/`write`/`scale`, host volumes and the coarse
/// agent/node/operator/quota blocks accept `deny`/`read`/`write`, and the
/// plugin block additionally accepts `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PolicyLevel {
    /// Refuse everything on the target, shadowing any other grant.
    Deny,
    /// List-only access (plugin subject).
    List,
    /// Read-class access.
    Read,
    /// Scaling operations only (namespace subject).
    Scale,
    /// Read-class plus write-class access.
    Write,
}

impl PolicyLevel {
    /// Precedence rank under the max-privilege rule:
    /// `deny > write > scale > read > list`.
    fn rank(self) -> u8 {
        match self {
            Self::List => 1,
            Self::Read => 2,
            Self::Scale => 3,
            Self::Write => 4,
            Self::Deny => 5,
        }
    }
}

impl fmt::Display for PolicyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Deny => "deny",
            Self::List => "list",
            Self::Read => "read",
            Self::Scale => "scale",
            Self::Write => "write",
        };
        f.write_str(s)
    }
}

/// Pick the higher-precedence privilege, treating `None` as unset.
///
/// This is the rule applied whenever two policies contribute a coarse alias
/// to the same subject.
#[must_use]
pub fn max_privilege(a: Option<PolicyLevel>, b: Option<PolicyLevel>) -> Option<PolicyLevel> {
    std::cmp::max_by_key(a, b, |p| p.map_or(0, PolicyLevel::rank))
}

// ---------------------------------------------------------------------------
// Policy document model
// ---------------------------------------------------------------------------

/// A parsed policy document.
///
/// This is the structural contract the configuration-language parser must
/// yield; the serde and JSON-schema derives define its wire shape. All
/// blocks are optional and the empty document is a valid zero-permission
/// policy. Policies are immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Policy {
    /// Name of the policy, used in error messages. May be blank.
    pub name: String,
    /// Namespace rules, literal or glob targets.
    pub namespaces: Vec<NamespaceRule>,
    /// Host-volume rules, literal or glob targets.
    pub host_volumes: Vec<HostVolumeRule>,
    /// Coarse agent block.
    pub agent: Option<CoarseRule>,
    /// Coarse node block.
    pub node: Option<CoarseRule>,
    /// Coarse operator block.
    pub operator: Option<CoarseRule>,
    /// Coarse quota block.
    pub quota: Option<CoarseRule>,
    /// Coarse plugin block.
    pub plugin: Option<CoarseRule>,
}

/// A namespace rule: target pattern, optional alias, explicit capabilities,
/// and an optional nested variables block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NamespaceRule {
    /// Namespace name or glob pattern.
    pub name: String,
    /// Coarse policy alias, expanded at compile time.
    pub policy: Option<PolicyLevel>,
    /// Explicit capabilities, unioned with the alias expansion.
    pub capabilities: Vec<String>,
    /// Variable path rules scoped to this namespace rule.
    pub variables: Option<VariablesBlock>,
}

/// The `variables` block nested inside a namespace rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct VariablesBlock {
    /// Path rules, literal or glob targets.
    pub paths: Vec<PathRule>,
}

/// A variable path rule. Paths have no alias form, only explicit
/// capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PathRule {
    /// Variable path or glob pattern.
    pub path: String,
    /// Granted capabilities; grants expand (`read` implies `list`, ...).
    pub capabilities: Vec<String>,
}

/// A host-volume rule: target pattern, optional alias, explicit
/// capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HostVolumeRule {
    /// Volume name or glob pattern.
    pub name: String,
    /// Coarse policy alias, expanded at compile time.
    pub policy: Option<PolicyLevel>,
    /// Explicit capabilities, unioned with the alias expansion.
    pub capabilities: Vec<String>,
}

/// A coarse top-level block (agent, node, operator, quota, plugin): only a
/// policy alias, no capability list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CoarseRule {
    /// Coarse policy alias.
    pub policy: Option<PolicyLevel>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Policy {
    /// Validate the document structure against the per-subject vocabularies
    /// and alias tables.
    ///
    /// # Errors
    ///
    /// Returns the first [`PolicyError`] found: unknown capability, alias
    /// illegal for its subject, or an unusable target name. Compilation
    /// refuses documents that fail here, so no partial ACL can exist.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for ns in &self.namespaces {
            self.check_target("namespace", &ns.name)?;
            if let Some(level) = ns.policy {
                if !matches!(
                    level,
                    PolicyLevel::Deny | PolicyLevel::Read | PolicyLevel::Write | PolicyLevel::Scale
                ) {
                    return Err(self.alias_error("namespace", &ns.name, level));
                }
            }
            for cap in &ns.capabilities {
                if !capability::namespace::is_valid(cap) {
                    return Err(self.capability_error("namespace", &ns.name, cap));
                }
            }
            if let Some(block) = &ns.variables {
                for rule in &block.paths {
                    self.check_target("variables path", &rule.path)?;
                    for cap in &rule.capabilities {
                        if !capability::variables::is_valid(cap) {
                            return Err(self.capability_error("variables path", &rule.path, cap));
                        }
                    }
                }
            }
        }

        for vol in &self.host_volumes {
            self.check_target("host_volume", &vol.name)?;
            if let Some(level) = vol.policy {
                if !matches!(
                    level,
                    PolicyLevel::Deny | PolicyLevel::Read | PolicyLevel::Write
                ) {
                    return Err(self.alias_error("host_volume", &vol.name, level));
                }
            }
            for cap in &vol.capabilities {
                if !capability::host_volume::is_valid(cap) {
                    return Err(self.capability_error("host_volume", &vol.name, cap));
                }
            }
        }

        for (subject, block) in [
            ("agent", &self.agent),
            ("node", &self.node),
            ("operator", &self.operator),
            ("quota", &self.quota),
        ] {
            if let Some(level) = block.as_ref().and_then(|r| r.policy) {
                if !matches!(
                    level,
                    PolicyLevel::Deny | PolicyLevel::Read | PolicyLevel::Write
                ) {
                    return Err(PolicyError::InvalidCoarseAlias {
                        policy: self.name.clone(),
                        subject,
                        level,
                    });
                }
            }
        }

        if let Some(level) = self.plugin.as_ref().and_then(|r| r.policy) {
            if level == PolicyLevel::Scale {
                return Err(PolicyError::InvalidCoarseAlias {
                    policy: self.name.clone(),
                    subject: "plugin",
                    level,
                });
            }
        }

        Ok(())
    }

    fn check_target(&self, subject: &'static str, target: &str) -> Result<(), PolicyError> {
        let reason = if target.is_empty() {
            Some("target is blank")
        } else if target.len() > MAX_TARGET_LEN {
            Some("target exceeds the length limit")
        } else if target.contains('\0') {
            Some("target contains a NUL byte")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(PolicyError::InvalidTarget {
                policy: self.name.clone(),
                subject,
                target: target.to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn alias_error(&self, subject: &'static str, target: &str, level: PolicyLevel) -> PolicyError {
        PolicyError::InvalidAlias {
            policy: self.name.clone(),
            subject,
            target: target.to_string(),
            level,
        }
    }

    fn capability_error(&self, subject: &'static str, target: &str, cap: &str) -> PolicyError {
        PolicyError::UnknownCapability {
            policy: self.name.clone(),
            subject,
            target: target.to_string(),
            capability: cap.to_string(),
        }
    }
}
