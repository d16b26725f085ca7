//! # Tessera (dual-token session issuer)
//!
//! `tessera` issues paired access and refresh tokens for an identity that has
//! already been authenticated upstream, and binds each token to a server-side
//! session record.
//!
//! ## Tokens
//!
//! Both tokens are HS256 JWTs signed with two independent secrets:
//!
//! - **Access token:** `{"authorized": true, "uuid": <access session id>, "exp": <unix>}`
//! - **Refresh token:** `{"uuid": <refresh session id>, "exp": <unix>}`
//!
//! The refresh token always outlives the access token.
//!
//! ## Session records
//!
//! Each session id is a key in the [`store::SessionStore`]; the value is the
//! JSON identity snapshot `{"id","username","email","phone"}`. A record's TTL
//! is derived from its token's `exp` at write time, so a record never outlives
//! its token. Records are never updated, only expired or revoked.
//!
//! ## Failure model
//!
//! Issuance is all-or-nothing up to the first store write. If the second
//! (refresh) write fails, the error is reported and the orphaned access record
//! expires on its own.

pub mod cli;
pub mod clock;
pub mod config;
pub mod session;
pub mod store;
pub mod token;

pub use config::IssuerConfig;
pub use session::{Identity, SessionIssuer, SessionPair};
