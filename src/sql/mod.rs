//! DDL generation from resolved tables.

mod dialect;
mod generator;
mod types;

pub use dialect::Dialect;
pub use generator::generate;
