//! Profile module: the users-service side of the platform. Mints ULIDs,
//! publishes profile lifecycle events, and keeps its own cached views warm.

pub mod domain;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::ProfileService;
