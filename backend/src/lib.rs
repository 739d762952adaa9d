//! synclist: shared lists with realtime claim coordination.
//!
//! The crate follows a hexagonal layout. [`domain`] holds entities, services
//! and ports; [`inbound`] adapts HTTP and WebSocket traffic onto the driving
//! ports; [`outbound`] implements the driven ports (PostgreSQL, in-memory
//! storage, topic fan-out, mail and credential primitives).

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
