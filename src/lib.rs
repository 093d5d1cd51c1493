pub mod cli;
pub mod config;
pub mod hash;
pub mod source;
pub mod store;

pub use config::Config;
pub use store::{DatalakeStore, Reconciliation};
