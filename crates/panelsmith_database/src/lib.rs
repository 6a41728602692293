//! Persistence collaborators for panelsmith.
//!
//! - [`InMemoryStore`] implements every store trait over process memory, for
//!   tests and dry runs.
//! - With the `postgres` feature, [`PostgresStore`] implements them with diesel.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;

#[cfg(feature = "postgres")]
mod connection;
#[cfg(feature = "postgres")]
mod models;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
mod schema;

pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use connection::{establish_connection, run_migrations};
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
