//! Storage and synchronisation core for the LinkedIn tag helper extension.
//!
//! The crate is laid out as a hexagon:
//!
//! - [`domain`] holds the entity model, the persisted schema and its legacy
//!   migration, the cached list store accessor, and the list mutation
//!   service. It talks to the outside world only through [`domain::ports`].
//! - [`outbound`] provides store and messaging adapters.
//! - [`inbound`] holds the popup and page controllers that turn user actions
//!   and cross-context messages into domain calls and user-facing notices.
//! - [`context`] composes one execution context (popup or page) from a
//!   store handle and the settings in [`config`].

pub mod config;
pub mod context;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use context::ExtensionContext;
