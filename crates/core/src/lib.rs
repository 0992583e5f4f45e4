//! Tienda Core - Shared domain types.
//!
//! This crate provides common types used across all Tienda components:
//! - `api` - REST backend (auth, users, products, clients, purchases)
//! - `web` - Server-rendered frontend consuming the REST API
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, phones, prices and roles
//! - [`validation`] - Field-level validation errors collected before store writes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{DateError, FieldError, ValidationErrors, parse_date};
