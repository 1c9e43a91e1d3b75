//! Book Monitor — polls a book catalog for new releases and emails the keepers.

pub mod catalog;
pub mod channels;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod store;
