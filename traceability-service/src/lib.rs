//! Traceability integration service.
//!
//! HTTP layer between the shop-floor clients (scanners, line terminals,
//! the status frontend) and the traceability database.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
