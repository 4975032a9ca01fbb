//! HTTP request handlers for the GeoServices REST API.

pub mod health;
pub mod query;
