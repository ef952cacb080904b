// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decision recording around an [`Acl`].
//!
//! The engine itself never logs; callers that need an audit trail wrap the
//! ACL in an [`AclAuditor`], which answers the same queries while keeping
//! an in-memory record of every decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Acl, WorkloadClaim};

/// A single recorded authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the query was evaluated.
    pub timestamp: DateTime<Utc>,
    /// Subject category queried (`namespace`, `host_volume`, `variable`, ...).
    pub subject: String,
    /// The resource name the query named.
    pub resource: String,
    /// The capability asked for, when the query names one.
    pub capability: Option<String>,
    /// The decision.
    pub allowed: bool,
}

/// Aggregate counts over a recorded trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditSummary {
    /// Queries that returned allow.
    pub allowed: usize,
    /// Queries that returned deny.
    pub denied: usize,
}

/// Wraps an [`Acl`] and records every decision for later inspection.
#[derive(Debug, Clone)]
pub struct AclAuditor {
    acl: Acl,
    log: Vec<AuditEntry>,
}

impl AclAuditor {
    /// Create a new auditor around the given ACL.
    #[must_use]
    pub fn new(acl: Acl) -> Self {
        Self {
            acl,
            log: Vec::new(),
        }
    }

    /// The wrapped ACL.
    #[must_use]
    pub fn acl(&self) -> &Acl {
        &self.acl
    }

    /// Namespace operation check, recorded.
    pub fn check_namespace_operation(&mut self, name: &str, capability: &str) -> bool {
        let allowed = self.acl.allow_namespace_operation(name, capability);
        self.record("namespace", name, Some(capability), allowed);
        allowed
    }

    /// Namespace visibility check, recorded.
    pub fn check_namespace(&mut self, name: &str) -> bool {
        let allowed = self.acl.allow_namespace(name);
        self.record("namespace", name, None, allowed);
        allowed
    }

    /// Host-volume operation check, recorded.
    pub fn check_host_volume_operation(&mut self, name: &str, capability: &str) -> bool {
        let allowed = self.acl.allow_host_volume_operation(name, capability);
        self.record("host_volume", name, Some(capability), allowed);
        allowed
    }

    /// Variable operation check, recorded. The resource is logged as
    /// `namespace/path`.
    pub fn check_variable_operation(
        &mut self,
        ns: &str,
        path: &str,
        op: &str,
        claim: Option<&WorkloadClaim>,
    ) -> bool {
        let allowed = self.acl.allow_variable_operation(ns, path, op, claim);
        let resource = format!("{ns}/{path}");
        self.record("variable", &resource, Some(op), allowed);
        allowed
    }

    /// All recorded entries in chronological order.
    #[must_use]
    pub fn entries(&self) -> &[AuditEntry] {
        &self.log
    }

    /// Number of denied decisions so far.
    #[must_use]
    pub fn denied_count(&self) -> usize {
        self.log.iter().filter(|e| !e.allowed).count()
    }

    /// Number of allowed decisions so far.
    #[must_use]
    pub fn allowed_count(&self) -> usize {
        self.log.iter().filter(|e| e.allowed).count()
    }

    /// Produce an aggregate summary of all recorded decisions.
    #[must_use]
    pub fn summary(&self) -> AuditSummary {
        AuditSummary {
            allowed: self.allowed_count(),
            denied: self.denied_count(),
        }
    }

    fn record(&mut self, subject: &str, resource: &str, capability: Option<&str>, allowed: bool) {
        self.log.push(AuditEntry {
            timestamp: Utc::now(),
            subject: subject.to_string(),
            resource: resource.to_string(),
            capability: capability.map(str::to_string),
            allowed,
        });
    }
}
