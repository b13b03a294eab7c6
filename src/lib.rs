//! Blogroll - A minimal blogging platform
//!
//! Bloggers write posts, readers comment on them. This library provides the
//! storage, business logic and HTML layer; `main.rs` wires them together.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod theme;
pub mod web;
