//! `PostgreSQL` record store implementation for the Obwira back-office.
//!
//! This crate provides a production `PostgreSQL`-backed implementation of
//! the `RecordStore` trait from `obwira-core`. Documents live in a single
//! JSONB table keyed by `(collection, id)`:
//!
//! - Listing with equality filters (JSONB containment) and
//!   descending-timestamp ordering
//! - Shallow-merge updates via the JSONB `||` operator
//! - All-or-nothing batches in one transaction
//! - Change signals via `LISTEN`/`NOTIFY`, fanned out to in-process
//!   broadcast channels
//!
//! # Example
//!
//! ```ignore
//! use obwira_postgres::PostgresRecordStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresRecordStore::connect("postgres://localhost/obwira", 5).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod record_store;

pub use record_store::PostgresRecordStore;
