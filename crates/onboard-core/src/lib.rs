//! Core onboarding client library (config, credentials, API pipeline, session, views).

pub mod api;
pub mod config;
pub mod models;
pub mod session;
pub mod store;
pub mod views;
