//! In-memory admin backend for the crew dashboard.
//!
//! Collections of records (activities, managed users, events) live in
//! process-wide stores seeded at startup. List requests go through a
//! pure filter/sort/paginate query engine; create/update/delete
//! requests go through the mutation protocol. Both are exposed over
//! HTTP by [`server`] and from the command line by [`cli`].

pub mod cli;
pub mod clock;
pub mod error;
pub mod models;
pub mod mutation;
pub mod query;
pub mod schema;
pub mod seed;
pub mod server;
pub mod store;
