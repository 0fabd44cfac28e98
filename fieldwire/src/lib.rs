//! Bootstrapping for [fieldwire_di] dependency injection.
//!
//! Applications register their dependencies once, at startup, and consumers resolve them lazily
//! through the process-wide [LookupPolicy](fieldwire_di::lookup_policy::LookupPolicy). This crate
//! provides the place where that happens, [Application](application::Application), which also
//! configures supporting infrastructure, e.g. logging and fatal error handling.

pub mod application;
pub mod config;
