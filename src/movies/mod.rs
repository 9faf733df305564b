//! Movie catalog domain types

pub mod models;

pub use models::*;
