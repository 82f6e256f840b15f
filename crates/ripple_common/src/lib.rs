//! Shared foundational types used across the Ripple incremental build core.
//!
//! This crate provides content hashing, fully-qualified scope names, stable
//! target identities, and the internal error type used to report contract
//! violations.

#![warn(missing_docs)]

pub mod fq_name;
pub mod hash;
pub mod result;
pub mod target;

pub use fq_name::FqName;
pub use hash::ContentHash;
pub use result::{InternalError, RippleResult};
pub use target::{BuildTarget, TargetId, TargetKind};
