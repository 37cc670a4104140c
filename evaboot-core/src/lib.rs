//! Evaboot Core
//!
//! Core types shared by the Evaboot client, runner and CLI.
//!
//! This crate contains:
//! - Domain types: remote jobs, resources, poll cursors and webhook events
//! - DTOs: request bodies and response envelopes exchanged with the API

pub mod domain;
pub mod dto;
