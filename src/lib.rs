//! orderdesk - projects, service orders and member lookup for small teams
//!
//! This library provides the HTTP handlers, database access and the
//! search-as-you-type member picker used by the orderdesk server.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod middleware;
pub mod models;
pub mod search;
pub mod views;
