pub mod config;
pub mod controller;
pub mod error;
pub mod interactions;
pub mod notify;
pub mod state;
mod tasks;

#[cfg(test)]
mod testing;
