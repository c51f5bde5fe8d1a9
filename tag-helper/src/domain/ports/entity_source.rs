//! Port for reading the profile or company shown on the current page.
//!
//! Adapters scrape the page however they need to; the core only sees either
//! a complete [`Entity`] or an extraction failure.

use async_trait::async_trait;

use crate::domain::Entity;

use super::define_port_error;

define_port_error! {
    /// Reasons an entity could not be built from the page.
    pub enum EntityExtractionError {
        /// The page is neither a member profile nor a company page.
        UnsupportedPage { path: String } => "page '{path}' is not a profile or company page",
            notice: "Could not extract profile/org data",
        /// A required value could not be located on the page.
        MissingField { field: String } => "could not read {field} from the page",
            notice: "Could not extract profile/org data",
    }
}

/// Source of the entity on the page the user is viewing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Extract the entity shown on the current page.
    async fn current_entity(&self) -> Result<Entity, EntityExtractionError>;
}
