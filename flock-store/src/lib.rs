pub mod backend;
pub mod client;
mod counters;
pub mod document;
pub mod error;
pub mod memory;
pub mod query;
mod record;
pub mod social;
pub mod transaction;
pub mod write;
