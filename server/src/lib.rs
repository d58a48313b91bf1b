//! Back-office HTTP service for the Obwira hotel.
//!
//! Staff sign in with an admin account and manage the hotel's catalog
//! (rooms, event halls, restaurant and bar menus, experiences), work the
//! reservation queue across the three booking collections, and watch a
//! live notification feed. Persistence goes through the record store
//! abstraction in `obwira-core`; the feed runs on an `obwira-runtime`
//! store fed by a change-signal subscription.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod blob;
pub mod config;
pub mod error;
pub mod featured;
pub mod notifications;
pub mod reservations;
pub mod server;
pub mod stats;
pub mod types;
