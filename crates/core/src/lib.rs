//! `warden-core`: claim model shared by authorization and token handling.
//!
//! This crate contains **pure data** primitives (no IO, no crypto, no async).

pub mod claim;
pub mod identity;
pub mod principal;

pub use claim::{Claim, claim_types};
pub use identity::ClaimsIdentity;
pub use principal::ClaimsPrincipal;
