//! Test utilities for the Perihelion session client.
//!
//! Provides scripted mocks for the controller's capability traits and
//! fixture builders for registry payloads:
//!
//! - [`MockIdentity`] - identity lookup with a configurable outcome
//! - [`MockRegistry`] - scripted create/join/end responses with call
//!   counters and optional latency
//! - [`MockTransport`] - event injection and connect/release observation
//!
//! # Example
//!
//! ```rust,ignore
//! use session_test_utils::{fixtures, MockRegistry};
//!
//! let registry = MockRegistry::builder()
//!     .create_response(Ok(fixtures::created_session("sess_123", 60, "tok_a")))
//!     .build();
//!
//! // Use registry in your tests...
//! ```

pub mod fixtures;
pub mod mock_identity;
pub mod mock_registry;
pub mod mock_transport;

pub use mock_identity::MockIdentity;
pub use mock_registry::{MockRegistry, MockRegistryBuilder};
pub use mock_transport::{MockTransport, MockTransportSession};
