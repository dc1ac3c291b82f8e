//! PostgreSQL platform database integration
//!
//! Reads the project registry from the platform's projects table and keeps
//! job settings and activity entries in tables created by the embedded
//! migration.

pub mod adapter;
pub mod client;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
