//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the user, list and one-time code repository
//! ports backed by PostgreSQL via `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: database errors are mapped to the port error
//!   enums; constraint violations with domain meaning get their own variants.
//!
//! # Example
//!
//! ```ignore
//! use synclist::outbound::persistence::{DbPool, DieselListRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/synclist")).await?;
//! let lists = DieselListRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_list_repository;
mod diesel_one_time_code_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_list_repository::DieselListRepository;
pub use diesel_one_time_code_repository::DieselOneTimeCodeRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DEFAULT_MAX_SIZE, DbPool, PoolConfig, PoolError};
