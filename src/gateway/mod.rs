//! Mutation gateway: forwards writes upstream and emits change events

mod error;
mod mutation;

pub use error::MutationError;
pub use mutation::MutationGateway;
