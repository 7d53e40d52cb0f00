pub mod dialect;
pub mod structure;

pub use dialect::{Dialect, UnknownDialect};
pub use structure::{Column, ForeignKey, Schema, Table};
