pub mod client;
pub mod error;
pub mod harvest;
pub mod source;
pub mod types;

pub use client::{RegisterClient, RegisterCredentials};
pub use error::RegisterError;
pub use harvest::{harvest, HarvestConfig, HarvestJob, HarvestSummary, HarvestTable};
pub use source::RegisterSource;
