//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod pagination;
pub mod problem;
pub mod statistics;
pub mod submission;
pub mod test_case;
pub mod user;

pub use pagination::*;
pub use problem::*;
pub use statistics::*;
pub use submission::*;
pub use test_case::*;
pub use user::*;
