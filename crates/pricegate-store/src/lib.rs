//! pricegate-store: persistence collaborators for the pricing core.
//! The single-campaign document store and the product catalog fetch
//! interface.

pub mod campaign;
pub mod catalog;
pub mod error;

pub use campaign::CampaignStore;
pub use catalog::{JsonCatalog, ProductCatalog};
pub use error::StoreError;
