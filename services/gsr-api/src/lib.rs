//! GeoServices REST API Service Library
//!
//! This crate provides the HTTP server for the GeoServices REST feature
//! query endpoint.

pub mod config;
pub mod handlers;
pub mod routes;
pub mod state;
