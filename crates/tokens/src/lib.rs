//! `warden-tokens`: compact signed token lifecycle (create, write, read, validate).
//!
//! Tokens are HMAC-signed, three-segment `header.payload.signature` strings.
//! Keys are supplied per call; nothing here holds key material.

pub mod algorithm;
pub mod base64url;
pub mod csrf;
pub mod error;
pub mod handler;
pub mod token;

pub use algorithm::SecurityAlgorithm;
pub use csrf::{AntiForgeryOptions, AntiForgeryToken, AntiForgeryTokenStore, InMemorySession, Session, SessionError};
pub use error::{TokenError, TokenResult};
pub use handler::{JwtSecurityTokenHandler, TokenHandlerConfig};
pub use token::{ClaimValue, JwtHeader, JwtPayload, JwtSecurityToken};
