//! `cardmesh-recon`: multi-provider card catalog reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded provider collections, returns
//! master records, mismatches, coverage and flags. No CLI or filesystem
//! dependencies; `load` only parses strings the caller already read.

pub mod classify;
pub mod config;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod identifier;
pub mod load;
pub mod model;
pub mod normalize;
pub mod product;
pub mod rarity;
pub mod report;

pub use classify::{classify, MismatchCategory};
pub use config::ReconConfig;
pub use engine::reconcile;
pub use error::{DataWarning, ReconError};
pub use identifier::{CardId, Scope};
pub use model::{MasterCardRecord, ProviderCollection, ProviderRecord, ReconInput, ReconOutput};
pub use product::ProductType;
