//! Data Transfer Objects for the Evaboot API
//!
//! Request bodies sent when creating jobs, the envelopes list endpoints
//! answer with, and the reduced record produced by a finished wait.

pub mod job;
