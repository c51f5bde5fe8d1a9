//! Outbound adapters implementing domain ports.
//!
//! - **storage**: in-memory and JSON-file key-value stores that emit change
//!   notifications like the browser's local storage area.
//! - **messaging**: an in-process stand-in for the browser's cross-context
//!   message channel.
//!
//! Adapters translate between domain types and their backing mechanism and
//! hold no list logic.

pub mod messaging;
pub mod storage;
