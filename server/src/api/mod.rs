//! HTTP API handlers.

pub mod catalog;
pub mod experiences;
pub mod notifications;
pub mod reservations;
pub mod stats;
pub mod uploads;
