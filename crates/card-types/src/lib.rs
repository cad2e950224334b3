//! Common types module for the CardCraft backend.
//!
//! This module defines the core data types and structures used throughout
//! the order-intake system. It provides a centralized location for shared
//! types to ensure consistency across all service crates.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Contact intake types.
pub mod contact;
/// Order types including statuses, tariffs and marketplaces.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Storage types for managing persistent data.
pub mod storage;
/// User account and identity types.
pub mod user;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use contact::*;
pub use order::*;
pub use registry::*;
pub use storage::*;
pub use user::*;
pub use validation::*;
