//! Configuration for editor sessions, the CLI and the backend server.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

#[cfg(test)]
mod tests;
