// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compilation of policy documents into the immutable decision structure,
//! and the query API over it.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use drover_glob::{WildcardIndex, is_wildcard};
use drover_policy::{
    HostVolumeRule, NamespaceRule, PathRule, Policy, PolicyError, PolicyLevel, capability,
    max_privilege,
};

use crate::CapabilitySet;

/// The reserved query name that asks "is the operation allowed on *any*
/// target?" instead of naming one.
pub const ANY_TARGET: &str = "*";

/// Variable path prefix implicitly readable by a workload claim. The
/// literal value is shared with every other implementation that stores
/// task variables, so it is frozen.
pub const WORKLOAD_VARIABLE_PREFIX: &str = "nomad/jobs";

/// The workload identity attached to a running task.
///
/// A claim is a second source of permission for variable queries: the task
/// may read the variables published under its own job path without any
/// explicit policy saying so.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadClaim {
    /// Namespace the workload runs in.
    pub namespace: String,
    /// Job the workload belongs to.
    pub job: String,
    /// Task group within the job.
    pub group: String,
    /// Task within the group.
    pub task: String,
}

impl WorkloadClaim {
    /// Build a claim from its four identity components.
    pub fn new(
        namespace: impl Into<String>,
        job: impl Into<String>,
        group: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            job: job.into(),
            group: group.into(),
            task: task.into(),
        }
    }

    /// The ancestor chain of paths this claim may read: the reserved prefix,
    /// then job, group, and task paths.
    fn readable_paths(&self) -> [String; 4] {
        let job = format!("{WORKLOAD_VARIABLE_PREFIX}/{}", self.job);
        let group = format!("{job}/{}", self.group);
        let task = format!("{group}/{}", self.task);
        [WORKLOAD_VARIABLE_PREFIX.to_string(), job, group, task]
    }
}

/// Variable path rules compiled under one namespace rule.
#[derive(Debug, Clone, Default)]
struct VariableRules {
    exact: HashMap<String, CapabilitySet>,
    wildcard: WildcardIndex<CapabilitySet>,
}

impl VariableRules {
    fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcard.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Acl
// ---------------------------------------------------------------------------

/// The compiled authorization object.
///
/// Built once from a fixed list of policies (or marked management), then
/// read-only: queries are pure functions over immutable state and the value
/// is safely shared across concurrent evaluators. A policy change is a
/// wholesale recompile, never an in-place mutation.
#[derive(Debug, Clone)]
pub struct Acl {
    management: bool,

    namespaces: HashMap<String, CapabilitySet>,
    wildcard_namespaces: WildcardIndex<CapabilitySet>,

    host_volumes: HashMap<String, CapabilitySet>,
    wildcard_host_volumes: WildcardIndex<CapabilitySet>,

    variables: HashMap<String, VariableRules>,
    wildcard_variables: WildcardIndex<VariableRules>,

    agent: Option<PolicyLevel>,
    node: Option<PolicyLevel>,
    operator: Option<PolicyLevel>,
    quota: Option<PolicyLevel>,
    plugin: Option<PolicyLevel>,
}

impl Acl {
    fn empty(management: bool) -> Self {
        Self {
            management,
            namespaces: HashMap::new(),
            wildcard_namespaces: WildcardIndex::new(),
            host_volumes: HashMap::new(),
            wildcard_host_volumes: WildcardIndex::new(),
            variables: HashMap::new(),
            wildcard_variables: WildcardIndex::new(),
            agent: None,
            node: None,
            operator: None,
            quota: None,
            plugin: None,
        }
    }

    /// A management ACL: every query returns allow.
    #[must_use]
    pub fn management() -> Self {
        Self::empty(true)
    }

    /// Compile `policies` into a client ACL.
    ///
    /// Exact targets repeated across policies merge by capability union;
    /// wildcard targets stay separate index entries; coarse subjects fold
    /// under the max-privilege rule.
    ///
    /// # Errors
    ///
    /// Returns the first [`PolicyError`] of any input document. Nothing is
    /// compiled on failure.
    pub fn compile(policies: &[Policy]) -> Result<Self, PolicyError> {
        for policy in policies {
            policy.validate()?;
        }

        let mut acl = Self::empty(false);
        for policy in policies {
            for rule in &policy.namespaces {
                acl.add_namespace_rule(rule);
            }
            for rule in &policy.host_volumes {
                acl.add_host_volume_rule(rule);
            }
            acl.agent = max_privilege(acl.agent, coarse_level(&policy.agent));
            acl.node = max_privilege(acl.node, coarse_level(&policy.node));
            acl.operator = max_privilege(acl.operator, coarse_level(&policy.operator));
            acl.quota = max_privilege(acl.quota, coarse_level(&policy.quota));
            acl.plugin = max_privilege(acl.plugin, coarse_level(&policy.plugin));
        }
        Ok(acl)
    }

    fn add_namespace_rule(&mut self, rule: &NamespaceRule) {
        let caps = namespace_capabilities(rule);

        if is_wildcard(&rule.name) {
            self.wildcard_namespaces.insert(rule.name.clone(), caps);
            if let Some(vars) = compile_variables(rule) {
                self.wildcard_variables.insert(rule.name.clone(), vars);
            }
        } else {
            self.namespaces
                .entry(rule.name.clone())
                .or_default()
                .merge(&caps);
            if let Some(vars) = compile_variables(rule) {
                let slot = self.variables.entry(rule.name.clone()).or_default();
                for (path, set) in vars.exact {
                    slot.exact.entry(path).or_default().merge(&set);
                }
                for (pattern, set) in vars.wildcard.iter() {
                    slot.wildcard.insert(pattern, set.clone());
                }
            }
        }
    }

    fn add_host_volume_rule(&mut self, rule: &HostVolumeRule) {
        let caps = host_volume_capabilities(rule);
        if is_wildcard(&rule.name) {
            self.wildcard_host_volumes.insert(rule.name.clone(), caps);
        } else {
            self.host_volumes
                .entry(rule.name.clone())
                .or_default()
                .merge(&caps);
        }
    }

    // -- queries ------------------------------------------------------------

    /// `true` for a management ACL.
    #[must_use]
    pub fn is_management(&self) -> bool {
        self.management
    }

    /// Is `capability` permitted on namespace `name`?
    ///
    /// `name == "*"` asks whether the capability is permitted on *any*
    /// namespace.
    #[must_use]
    pub fn allow_namespace_operation(&self, name: &str, capability: &str) -> bool {
        if self.management {
            return true;
        }
        if !valid_query_name(name) {
            return false;
        }
        if name == ANY_TARGET {
            return self.namespaces.values().any(|set| set.check(capability))
                || self
                    .wildcard_namespaces
                    .values()
                    .any(|set| set.check(capability));
        }
        effective_capabilities(&self.namespaces, &self.wildcard_namespaces, name)
            .is_some_and(|set| set.check(capability))
    }

    /// Should namespace `name` be visible to the caller at all?
    #[must_use]
    pub fn allow_namespace(&self, name: &str) -> bool {
        if self.management {
            return true;
        }
        if !valid_query_name(name) {
            return false;
        }
        if name == ANY_TARGET {
            return self.namespaces.values().any(CapabilitySet::allows_any)
                || self
                    .wildcard_namespaces
                    .values()
                    .any(CapabilitySet::allows_any);
        }
        effective_capabilities(&self.namespaces, &self.wildcard_namespaces, name)
            .is_some_and(|set| set.allows_any())
    }

    /// Is `capability` permitted on host volume `name`?
    #[must_use]
    pub fn allow_host_volume_operation(&self, name: &str, capability: &str) -> bool {
        if self.management {
            return true;
        }
        if !valid_query_name(name) {
            return false;
        }
        if name == ANY_TARGET {
            return self.host_volumes.values().any(|set| set.check(capability))
                || self
                    .wildcard_host_volumes
                    .values()
                    .any(|set| set.check(capability));
        }
        effective_capabilities(&self.host_volumes, &self.wildcard_host_volumes, name)
            .is_some_and(|set| set.check(capability))
    }

    /// Should host volume `name` be visible to the caller at all?
    #[must_use]
    pub fn allow_host_volume(&self, name: &str) -> bool {
        if self.management {
            return true;
        }
        if !valid_query_name(name) {
            return false;
        }
        if name == ANY_TARGET {
            return self.host_volumes.values().any(CapabilitySet::allows_any)
                || self
                    .wildcard_host_volumes
                    .values()
                    .any(CapabilitySet::allows_any);
        }
        effective_capabilities(&self.host_volumes, &self.wildcard_host_volumes, name)
            .is_some_and(|set| set.allows_any())
    }

    /// Is `op` permitted on the variable at `path` within namespace `ns`?
    ///
    /// Resolution is layered: every namespace rule applying to `ns` (the
    /// exact entry plus all matching wildcards) selects its best path rule
    /// independently, and any allow wins. A workload `claim` for `ns` adds
    /// an implicit read-class grant on the ancestor chain of its own job
    /// path, overridden only by an exact rule at the queried path that
    /// lists `deny`.
    #[must_use]
    pub fn allow_variable_operation(
        &self,
        ns: &str,
        path: &str,
        op: &str,
        claim: Option<&WorkloadClaim>,
    ) -> bool {
        if self.management {
            return true;
        }
        if !valid_query_name(ns) || !valid_query_name(path) {
            return false;
        }

        let candidates = self.variable_candidates(ns);

        for rules in &candidates {
            let selected = effective_capabilities(&rules.exact, &rules.wildcard, path);
            if selected.is_some_and(|set| set.check(op)) {
                return true;
            }
        }

        if let Some(claim) = claim {
            if claim_grants(claim, ns, path, op) && !exact_deny_at(&candidates, path) {
                return true;
            }
        }

        false
    }

    /// Does any variable path rule exist under any namespace rule applying
    /// to `ns`? This is the listing-visibility analogue for variables.
    #[must_use]
    pub fn allow_variable_search(&self, ns: &str) -> bool {
        if self.management {
            return true;
        }
        if !valid_query_name(ns) {
            return false;
        }
        self.variable_candidates(ns)
            .iter()
            .any(|rules| !rules.is_empty())
    }

    fn variable_candidates(&self, ns: &str) -> Vec<&VariableRules> {
        let mut candidates = Vec::new();
        if let Some(rules) = self.variables.get(ns) {
            candidates.push(rules);
        }
        for m in self.wildcard_variables.find_all_matching(ns) {
            candidates.push(m.value);
        }
        candidates
    }

    /// Read access to agent endpoints.
    #[must_use]
    pub fn allow_agent_read(&self) -> bool {
        self.management || allows_read(self.agent)
    }

    /// Write access to agent endpoints.
    #[must_use]
    pub fn allow_agent_write(&self) -> bool {
        self.management || allows_write(self.agent)
    }

    /// Read access to node endpoints.
    #[must_use]
    pub fn allow_node_read(&self) -> bool {
        self.management || allows_read(self.node)
    }

    /// Write access to node endpoints.
    #[must_use]
    pub fn allow_node_write(&self) -> bool {
        self.management || allows_write(self.node)
    }

    /// Read access to operator endpoints.
    #[must_use]
    pub fn allow_operator_read(&self) -> bool {
        self.management || allows_read(self.operator)
    }

    /// Write access to operator endpoints.
    #[must_use]
    pub fn allow_operator_write(&self) -> bool {
        self.management || allows_write(self.operator)
    }

    /// Read access to quota endpoints.
    #[must_use]
    pub fn allow_quota_read(&self) -> bool {
        self.management || allows_read(self.quota)
    }

    /// Write access to quota endpoints.
    #[must_use]
    pub fn allow_quota_write(&self) -> bool {
        self.management || allows_write(self.quota)
    }

    /// Read access to plugin endpoints.
    #[must_use]
    pub fn allow_plugin_read(&self) -> bool {
        self.management || allows_read(self.plugin)
    }

    /// List access to plugin endpoints; the `list` alias grants this and
    /// nothing else.
    #[must_use]
    pub fn allow_plugin_list(&self) -> bool {
        self.management
            || matches!(
                self.plugin,
                Some(PolicyLevel::List | PolicyLevel::Read | PolicyLevel::Write)
            )
    }
}

// ---------------------------------------------------------------------------
// Compilation helpers
// ---------------------------------------------------------------------------

fn coarse_level(rule: &Option<drover_policy::CoarseRule>) -> Option<PolicyLevel> {
    rule.as_ref().and_then(|r| r.policy)
}

fn namespace_capabilities(rule: &NamespaceRule) -> CapabilitySet {
    let mut set = CapabilitySet::new();
    if let Some(level) = rule.policy {
        for cap in capability::namespace::expand(level) {
            set.set(cap);
        }
    }
    for cap in &rule.capabilities {
        set.set(cap);
    }
    set
}

fn host_volume_capabilities(rule: &HostVolumeRule) -> CapabilitySet {
    let mut set = CapabilitySet::new();
    if let Some(level) = rule.policy {
        for cap in capability::host_volume::expand(level) {
            set.set(cap);
        }
    }
    for cap in &rule.capabilities {
        set.set(cap);
    }
    set
}

fn path_capabilities(rule: &PathRule) -> CapabilitySet {
    let mut set = CapabilitySet::new();
    for cap in &rule.capabilities {
        for expanded in capability::variables::expand_grant(cap) {
            set.set(expanded);
        }
    }
    set
}

fn compile_variables(rule: &NamespaceRule) -> Option<VariableRules> {
    let block = rule.variables.as_ref()?;
    if block.paths.is_empty() {
        return None;
    }
    let mut vars = VariableRules::default();
    for path_rule in &block.paths {
        let set = path_capabilities(path_rule);
        if is_wildcard(&path_rule.path) {
            vars.wildcard.insert(path_rule.path.clone(), set);
        } else {
            vars.exact
                .entry(path_rule.path.clone())
                .or_default()
                .merge(&set);
        }
    }
    Some(vars)
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

fn valid_query_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('\0')
}

/// Select the effective capability set for `name`: the exact entry if one
/// exists, otherwise the most specific wildcard match (ties broken by
/// lexicographic pattern order). Entries sharing the winning pattern behave
/// as their union.
fn effective_capabilities<'a>(
    exact: &'a HashMap<String, CapabilitySet>,
    wildcard: &'a WildcardIndex<CapabilitySet>,
    name: &str,
) -> Option<Cow<'a, CapabilitySet>> {
    if let Some(set) = exact.get(name) {
        return Some(Cow::Borrowed(set));
    }

    let matches = wildcard.find_all_matching(name);
    let best = matches
        .iter()
        .min_by_key(|m| (m.specificity, m.pattern))?;

    let mut winners = matches.iter().filter(|m| m.pattern == best.pattern);
    let first = winners.next()?;
    let mut merged: Option<CapabilitySet> = None;
    for dup in winners {
        merged
            .get_or_insert_with(|| first.value.clone())
            .merge(dup.value);
    }
    match merged {
        Some(set) => Some(Cow::Owned(set)),
        None => Some(Cow::Borrowed(first.value)),
    }
}

fn exact_deny_at(candidates: &[&VariableRules], path: &str) -> bool {
    candidates
        .iter()
        .any(|rules| rules.exact.get(path).is_some_and(CapabilitySet::is_denied))
}

fn claim_grants(claim: &WorkloadClaim, ns: &str, path: &str, op: &str) -> bool {
    if claim.namespace != ns {
        return false;
    }
    if op != capability::variables::READ && op != capability::variables::LIST {
        return false;
    }
    claim.readable_paths().iter().any(|p| p == path)
}

fn allows_read(level: Option<PolicyLevel>) -> bool {
    matches!(level, Some(PolicyLevel::Read | PolicyLevel::Write))
}

fn allows_write(level: Option<PolicyLevel>) -> bool {
    matches!(level, Some(PolicyLevel::Write))
}

#[cfg(test)]
mod tests {
    use super::*;
    use drover_policy::CoarseRule;

    fn coarse(level: PolicyLevel) -> Option<CoarseRule> {
        Some(CoarseRule {
            policy: Some(level),
        })
    }

    #[test]
    fn management_allows_everything() {
        let acl = Acl::management();
        assert!(acl.is_management());
        assert!(acl.allow_namespace_operation("default", "submit-job"));
        assert!(acl.allow_namespace("anything"));
        assert!(acl.allow_host_volume("vol"));
        assert!(acl.allow_variable_operation("ns", "any/path", "destroy", None));
        assert!(acl.allow_variable_search("ns"));
        assert!(acl.allow_agent_write());
        assert!(acl.allow_plugin_list());
    }

    #[test]
    fn empty_policy_list_denies_everything() {
        let acl = Acl::compile(&[]).expect("compile empty list");
        assert!(!acl.is_management());
        assert!(!acl.allow_namespace_operation("default", "list-jobs"));
        assert!(!acl.allow_namespace("default"));
        assert!(!acl.allow_namespace("*"));
        assert!(!acl.allow_host_volume("vol"));
        assert!(!acl.allow_variable_operation("ns", "path", "read", None));
        assert!(!acl.allow_variable_search("ns"));
        assert!(!acl.allow_agent_read());
        assert!(!acl.allow_node_write());
        assert!(!acl.allow_operator_read());
        assert!(!acl.allow_quota_write());
        assert!(!acl.allow_plugin_read());
        assert!(!acl.allow_plugin_list());
    }

    #[test]
    fn coarse_subjects_fold_by_max_privilege() {
        let read = Policy {
            agent: coarse(PolicyLevel::Read),
            node: coarse(PolicyLevel::Read),
            ..Policy::default()
        };
        let write = Policy {
            agent: coarse(PolicyLevel::Write),
            ..Policy::default()
        };
        let deny = Policy {
            node: coarse(PolicyLevel::Deny),
            ..Policy::default()
        };

        let acl = Acl::compile(&[read, write, deny]).expect("compile");
        // {read, write} folds to write
        assert!(acl.allow_agent_read());
        assert!(acl.allow_agent_write());
        // {read, deny} folds to deny
        assert!(!acl.allow_node_read());
        assert!(!acl.allow_node_write());
        // untouched subjects stay unset
        assert!(!acl.allow_operator_read());
    }

    #[test]
    fn plugin_list_alias_grants_list_only() {
        let acl = Acl::compile(&[Policy {
            plugin: coarse(PolicyLevel::List),
            ..Policy::default()
        }])
        .expect("compile");
        assert!(acl.allow_plugin_list());
        assert!(!acl.allow_plugin_read());
    }

    #[test]
    fn invalid_policy_compiles_to_nothing() {
        let bad = Policy {
            name: "bad".to_string(),
            namespaces: vec![NamespaceRule {
                name: "default".to_string(),
                capabilities: vec!["no-such-capability".to_string()],
                ..NamespaceRule::default()
            }],
            ..Policy::default()
        };
        let err = Acl::compile(&[bad]).unwrap_err();
        assert!(matches!(err, PolicyError::UnknownCapability { .. }));
    }

    #[test]
    fn malformed_query_names_deny() {
        let acl = Acl::compile(&[Policy {
            namespaces: vec![NamespaceRule {
                name: "ns".to_string(),
                policy: Some(PolicyLevel::Write),
                ..NamespaceRule::default()
            }],
            ..Policy::default()
        }])
        .expect("compile");

        assert!(!acl.allow_namespace_operation("", "list-jobs"));
        assert!(!acl.allow_namespace_operation("ns\0*", "list-jobs"));
        assert!(!acl.allow_namespace("ns\0"));
        assert!(!acl.allow_variable_operation("ns\0*", "path", "read", None));
        assert!(!acl.allow_variable_operation("ns", "pa\0th", "read", None));
        assert!(!acl.allow_variable_search("\0"));
    }
}
