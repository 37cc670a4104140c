//! Core domain types
//!
//! These types describe what the local system observes of the remote
//! Evaboot service (job snapshots, their resource kind) and the small amount
//! of state it keeps while converging on them (poll cursors, webhook events).

pub mod cursor;
pub mod event;
pub mod job;
pub mod resource;
