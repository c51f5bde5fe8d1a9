//! Inbound controllers that turn user actions and cross-context messages
//! into domain calls, keeping UI feedback at the edge.
//!
//! [`popup`] drives the list manager popup; [`page`] runs inside the
//! LinkedIn page and owns the post editor and the collect button.

pub mod page;
pub mod popup;
