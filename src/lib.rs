//! Temporal consistency and aggregation engine for workforce time tracking.
//!
//! This crate provides the core rules of a multi-company workforce system:
//! clock sessions that can never be double-opened, shift bookings that can
//! never overlap, worked-hour aggregation under partial data, and prorated
//! leave entitlement allocation across employment categories.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod store;
