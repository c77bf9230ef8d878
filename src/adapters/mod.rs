//! Adapters that implement domain ports in-process.

pub mod cache;
