//! Service layer for business logic with dependency injection.
//!
//! Services accept trait-based dependencies, enabling testing with mock
//! implementations.

pub mod lookup;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub mod test_mocks;

pub use lookup::{Include, LookupService, UserReport};
