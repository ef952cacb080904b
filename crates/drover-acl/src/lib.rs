// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! drover-acl
#![deny(unsafe_code)]

mod acl;
/// Decision recording around an [`Acl`].
pub mod audit;
mod capability_set;

pub use acl::{ANY_TARGET, Acl, WORKLOAD_VARIABLE_PREFIX, WorkloadClaim};
pub use audit::{AclAuditor, AuditEntry, AuditSummary};
pub use capability_set::CapabilitySet;

// Callers matching on compile failures only need this crate.
pub use drover_policy::PolicyError;
