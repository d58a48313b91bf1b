//! # Obwira Core
//!
//! Core traits and types for the Obwira back-office service.
//!
//! This crate provides the fundamental abstractions shared by every other
//! crate in the workspace:
//!
//! - **Document model**: schema-less records in named collections
//! - **`RecordStore`**: uniform CRUD + batch + subscription over collections
//! - **`BlobStore`**: write-once binary uploads with public URLs
//! - **Reducer**: pure transition function `(State, Action, Environment) → Effects`
//! - **Effect**: side effect descriptions (values, not execution)
//! - **Environment**: injected dependencies (stores) passed to reducers
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional data flow: adapters → aggregators → presentation
//! - Explicit effects (no hidden I/O in transition functions)
//! - Dependency injection via Environment
//!
//! ## Example
//!
//! ```ignore
//! use obwira_core::prelude::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct FeedState { unread: usize }
//!
//! #[derive(Clone, Debug)]
//! enum FeedAction { Snapshot(Vec<Notification>) }
//!
//! impl Reducer for FeedReducer {
//!     type State = FeedState;
//!     type Action = FeedAction;
//!     type Environment = FeedEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut FeedState,
//!         action: FeedAction,
//!         env: &FeedEnvironment,
//!     ) -> SmallVec<[Effect<FeedAction>; 4]> {
//!         // transition logic goes here
//!         SmallVec::new()
//!     }
//! }
//! ```

pub mod blob_store;
pub mod document;
pub mod effect;
pub mod record_store;
pub mod reducer;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::SmallVec;

/// Convenience prelude pulling in the types nearly every consumer needs.
pub mod prelude {
    pub use crate::blob_store::{BlobKey, BlobStore, BlobStoreError};
    pub use crate::document::{Collection, Document, DocumentId, Filter, SortOrder};
    pub use crate::effect::Effect;
    pub use crate::record_store::{RecordStore, RecordStoreError, WriteOp};
    pub use crate::reducer::Reducer;
    pub use crate::SmallVec;
}
