// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rolegate - Bearer Token Authentication and Role-Based Authorization
//!
//! This crate verifies RSA-signed JWTs issued by an external identity
//! provider and decides, per request, whether the caller may proceed.
//!
//! ## Modules
//!
//! - `auth` - Key providers, token verification, Axum middleware
//! - `authz` - Authorization policies (simple four-role model, RBAC)
//! - `rbac` - Role graph with inheritance and pattern permissions
//! - `users` - User directory (identity → roles)
//! - `api` - Demo HTTP server wiring everything together

pub mod api;
pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod format;
pub mod rbac;
pub mod state;
pub mod users;
