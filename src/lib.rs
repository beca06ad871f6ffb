// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Newsroom Server - News Publishing REST API
//!
//! Accounts, news articles and advertisement placements persisted as JSON
//! documents, behind token authentication, role gates and ownership checks.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Token codec, password hashing, request gates
//! - `config` - Environment configuration
//! - `mail` - Outbound mail (SMTP or log-only)
//! - `storage` - JSON document store, repositories, ownership policy

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod state;
pub mod storage;
