//! Middleware

pub mod auth;
