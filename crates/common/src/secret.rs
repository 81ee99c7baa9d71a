//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate with Perihelion-specific guidance.
//! Use these types for every credential that passes through the client:
//! session access tokens, bearer tokens for the registry, and anything else
//! that must never appear in logs.
//!
//! `SecretString` implements `Debug` with redaction, so any struct that
//! derives `Debug` around it gets safe logging behavior for free, and
//! secrets are zeroized on drop. Reading the value requires an explicit
//! `expose_secret()` call at the point of use.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct BackendAuth {
//!     base_url: String,
//!     bearer: SecretString,
//! }
//!
//! let auth = BackendAuth {
//!     base_url: "https://registry.example".to_string(),
//!     bearer: SecretString::from("tok_abc"),
//! };
//!
//! // Safe: the bearer is redacted
//! let rendered = format!("{auth:?}");
//! assert!(!rendered.contains("tok_abc"));
//!
//! // Explicit exposure at the call site
//! let header = format!("Bearer {}", auth.bearer.expose_secret());
//! ```
//!
//! # Usage guidelines
//!
//! Use `SecretString` for:
//! - Registry bearer tokens (configuration)
//! - Session access tokens (see `common::types::AccessToken`)
//!
//! Use `SecretBox<T>` for custom secret types holding non-string material.

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};
