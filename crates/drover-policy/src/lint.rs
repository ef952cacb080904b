// SPDX-License-Identifier: MIT OR Apache-2.0
//! Advisory lint pass over a parsed policy document.
//!
//! Lint never blocks compilation; it surfaces rules that are legal but
//! probably not what the author meant.

use std::collections::HashSet;

use crate::{HostVolumeRule, NamespaceRule, Policy, PolicyLevel, capability};

/// A warning produced by [`lint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyWarning {
    /// Machine-readable warning kind.
    pub kind: WarningKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of policy lint warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// `deny` appears alongside other grants on one rule; the grants are
    /// dead because deny shadows them.
    DenyMixedWithGrants,
    /// The same exact target appears in more than one rule of this policy.
    DuplicateTarget,
    /// A rule that grants nothing: no alias, no capabilities, no variables.
    EmptyRule,
    /// A catch-all `*` deny rule; every less specific rule on the subject is
    /// shadowed for names it matches.
    CatchAllDeny,
}

/// Analyse `policy` and report anything suspicious.
#[must_use]
pub fn lint(policy: &Policy) -> Vec<PolicyWarning> {
    let mut warnings = Vec::new();

    let mut seen_namespaces = HashSet::new();
    for ns in &policy.namespaces {
        if !seen_namespaces.insert(ns.name.as_str()) {
            warnings.push(PolicyWarning {
                kind: WarningKind::DuplicateTarget,
                message: format!("namespace {:?} appears more than once", ns.name),
            });
        }
        check_namespace_rule(ns, &mut warnings);
    }

    let mut seen_volumes = HashSet::new();
    for vol in &policy.host_volumes {
        if !seen_volumes.insert(vol.name.as_str()) {
            warnings.push(PolicyWarning {
                kind: WarningKind::DuplicateTarget,
                message: format!("host_volume {:?} appears more than once", vol.name),
            });
        }
        check_host_volume_rule(vol, &mut warnings);
    }

    warnings
}

fn check_namespace_rule(ns: &NamespaceRule, warnings: &mut Vec<PolicyWarning>) {
    let denies = ns.policy == Some(PolicyLevel::Deny)
        || ns.capabilities.iter().any(|c| c == capability::DENY);
    let grants = matches!(
        ns.policy,
        Some(PolicyLevel::Read) | Some(PolicyLevel::Write) | Some(PolicyLevel::Scale)
    ) || ns.capabilities.iter().any(|c| c != capability::DENY);

    if denies && grants {
        warnings.push(PolicyWarning {
            kind: WarningKind::DenyMixedWithGrants,
            message: format!(
                "namespace {:?} mixes deny with other grants; deny shadows them",
                ns.name
            ),
        });
    }
    if denies && ns.name == "*" {
        warnings.push(PolicyWarning {
            kind: WarningKind::CatchAllDeny,
            message: "namespace \"*\" denies every namespace this policy does not name exactly"
                .to_string(),
        });
    }
    if !denies && !grants && ns.variables.is_none() {
        warnings.push(PolicyWarning {
            kind: WarningKind::EmptyRule,
            message: format!("namespace {:?} grants nothing", ns.name),
        });
    }

    if let Some(block) = &ns.variables {
        let mut seen_paths = HashSet::new();
        for rule in &block.paths {
            if !seen_paths.insert(rule.path.as_str()) {
                warnings.push(PolicyWarning {
                    kind: WarningKind::DuplicateTarget,
                    message: format!(
                        "namespace {:?}: variables path {:?} appears more than once",
                        ns.name, rule.path
                    ),
                });
            }
            let path_denies = rule.capabilities.iter().any(|c| c == capability::DENY);
            let path_grants = rule.capabilities.iter().any(|c| c != capability::DENY);
            if path_denies && path_grants {
                warnings.push(PolicyWarning {
                    kind: WarningKind::DenyMixedWithGrants,
                    message: format!(
                        "namespace {:?}: variables path {:?} mixes deny with other capabilities",
                        ns.name, rule.path
                    ),
                });
            }
            if rule.capabilities.is_empty() {
                warnings.push(PolicyWarning {
                    kind: WarningKind::EmptyRule,
                    message: format!(
                        "namespace {:?}: variables path {:?} grants nothing",
                        ns.name, rule.path
                    ),
                });
            }
        }
    }
}

fn check_host_volume_rule(vol: &HostVolumeRule, warnings: &mut Vec<PolicyWarning>) {
    let denies = vol.policy == Some(PolicyLevel::Deny)
        || vol.capabilities.iter().any(|c| c == capability::DENY);
    let grants = matches!(
        vol.policy,
        Some(PolicyLevel::Read) | Some(PolicyLevel::Write)
    ) || vol.capabilities.iter().any(|c| c != capability::DENY);

    if denies && grants {
        warnings.push(PolicyWarning {
            kind: WarningKind::DenyMixedWithGrants,
            message: format!(
                "host_volume {:?} mixes deny with other grants; deny shadows them",
                vol.name
            ),
        });
    }
    if denies && vol.name == "*" {
        warnings.push(PolicyWarning {
            kind: WarningKind::CatchAllDeny,
            message: "host_volume \"*\" denies every volume this policy does not name exactly"
                .to_string(),
        });
    }
    if !denies && !grants {
        warnings.push(PolicyWarning {
            kind: WarningKind::EmptyRule,
            message: format!("host_volume {:?} grants nothing", vol.name),
        });
    }
}
