//! # Obwira Testing
//!
//! Testing utilities for the Obwira back-office.
//!
//! This crate provides:
//! - In-memory `RecordStore` and `BlobStore` implementations
//! - The `ReducerTest` fluent assertion builder
//!
//! ## Example
//!
//! ```ignore
//! use obwira_testing::InMemoryRecordStore;
//!
//! #[tokio::test]
//! async fn test_booking_flow() {
//!     let store = InMemoryRecordStore::new();
//!     store.seed(Collection::Bookings, booking_doc("b1", "pending")).await;
//!
//!     let bookings = list_reservations(&store, None).await.unwrap();
//!     assert_eq!(bookings.len(), 1);
//! }
//! ```

pub mod memory;

// Re-export commonly used items
pub use memory::{InMemoryBlobStore, InMemoryRecordStore};
pub use reducer_test::{assertions, ReducerTest};
