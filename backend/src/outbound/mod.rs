//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: process-local repositories for development and tests
//! - **fanout**: in-process list topic registry
//! - **security**: Argon2id password hashing and signed reset credentials
//! - **mail**: HTTP mail API and logging transports
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod fanout;
pub mod mail;
pub mod memory;
pub mod persistence;
pub mod security;
