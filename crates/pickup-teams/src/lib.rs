// Library root: re-exports all modules so integration tests and the binary
// can reach the crate's public API.

pub mod config;
pub mod db;
pub mod formation;
pub mod host;
pub mod pool;
