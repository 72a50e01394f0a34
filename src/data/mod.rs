//! Data module - CSV loading and dataset access

mod loader;
pub mod processor;

pub use loader::{DataLoader, LoaderError};
