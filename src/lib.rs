//! # Quotesmith Backend
//!
//! Multi-tenant quoting backend for small service businesses.
//!
//! This crate provides a REST API for managing accounts, client records
//! and priced quotes. Each registered user works in an isolated tenant:
//! clients and quotes belong to exactly one account, quote numbers are
//! sequential per account, and totals are always derived from the line
//! items rather than stored.
//!
//! ## Features
//!
//! - **Accounts**: Registration, login with bearer tokens, profile and
//!   logo management, dashboard statistics
//! - **Clients**: CRUD on customer records with a globally unique tax id
//! - **Quotes**: Line-item quotes with per-tenant sequential numbering,
//!   workflow statuses and derived totals
//! - **Documents**: Server-side PDF rendering of quotes
//! - **HTTP API**: RESTful endpoints via axum
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Core domain types shared by every layer
//! - [`auth`]: Password hashing and bearer-token handling
//! - [`config`]: Environment-driven runtime configuration
//! - [`db`]: Repository pattern with Postgres and in-memory backends
//! - [`services`]: Business logic on top of the repository traits
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
