//! Access control services

pub mod authorization;
pub mod role_assignment;
pub mod subscription;

pub use authorization::PermissionSet;
pub use role_assignment::{Assignment, AssignmentError, StatusChange, Trigger};
