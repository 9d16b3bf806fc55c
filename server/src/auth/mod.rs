//! Authentication module.
//!
//! This module holds the session core of the quill server: credential
//! hashing, token issuance/verification, and the session protocol that
//! orchestrates them over the user directory and refresh-token ledger.
//!
//! # Pre-conditions
//! - The server must be configured with a non-empty signing secret.
//!
//! # Post-conditions
//! - Resource handlers only ever see verified `AccessClaims`, never raw
//!   tokens.
//!
//! # Invariants
//! - Clear passwords are never stored or compared; all credential checks
//!   go through the `CredentialScheme` capability.

pub mod password;
pub mod session;
pub mod token;

pub use password::{Argon2Scheme, CredentialScheme};
pub use session::{AuthError, AuthSuccess, SessionService};
pub use token::{AccessClaims, TokenError, TokenIssuer};
