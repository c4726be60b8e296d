//! # authority-types: core value types for the state authority
//!
//! Shared types referenced by every other crate in the workspace:
//! - Entity identifiers ([`InstanceId`], [`AgentId`], [`OfferId`], [`RequestId`])
//! - Run-spec addressing ([`RunSpecRef`], [`RunSpecPath`], [`RunSpecVersion`])
//! - Instance lifecycle ([`Goal`], [`Condition`])
//! - Temporal types ([`Timestamp`], [`Incarnation`])
//! - User-visible rejection reasons ([`RejectionKind`], [`Rejection`])
//!
//! This crate has no I/O and no logic beyond construction-time validation;
//! it exists so that invalid values (a `RunSpecPath` not starting with `/`,
//! an `Incarnation` of zero) are unrepresentable rather than checked at
//! every call site.

mod condition;
mod ids;
mod rejection;
mod run_spec_ref;

pub use condition::{Condition, Goal};
pub use ids::{AgentId, FrameworkId, Incarnation, InstanceId, OfferId, RequestId, Timestamp};
pub use rejection::{Rejection, RejectionKind};
pub use run_spec_ref::{RunSpecPath, RunSpecRef, RunSpecVersion};
