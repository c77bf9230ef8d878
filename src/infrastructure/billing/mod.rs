//! Billing/license service adapter.

pub mod client;

pub use client::BillingClient;
