//! Core library exports for the investor forms service.
//!
//! This crate exposes the investor draft model, its validation forms, the
//! remote investor API client, and the services and routes used by the
//! investor forms web application.

#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "data")]
pub mod forms;

#[cfg(feature = "server")]
pub mod client;
#[cfg(feature = "server")]
pub mod drafts;
#[cfg(feature = "server")]
pub mod models;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod services;
