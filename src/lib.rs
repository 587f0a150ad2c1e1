//! CRPT Client - Rate-Limited Document Submission
//!
//! This crate submits documents to the CRPT document-creation API while
//! bounding the number of outbound calls with a sliding-window rate limiter.
//! Callers over the limit are suspended until the window frees a permit.

pub mod api;
pub mod config;
pub mod error;
pub mod ratelimit;
