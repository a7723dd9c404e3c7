pub mod catalog;
pub mod cbir;
pub mod cli;
pub mod config;
mod db;
pub mod descriptor;
mod error;
pub mod extract;
pub mod feedback;
mod metrics;
pub mod ranking;
pub mod retriever;
mod server;
pub mod similarity;
pub mod utils;

pub use cbir::{CBIR, CBIRBuilder};
pub use config::Opts;
pub use descriptor::{DescriptorKind, DescriptorSet, Weights};
pub use error::{Error, Result};
