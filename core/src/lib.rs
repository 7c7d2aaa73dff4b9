//! Async client for the ZAICO inventory API.
//!
//! # Overview
//! `Client` builds authenticated JSON requests against a base endpoint and
//! executes them with `reqwest`; `InventoryService` maps list/get/create/
//! update/delete onto `/inventories` and `/inventories/{id}`.
//!
//! # Design
//! - `Client` is immutable after construction and cheap to clone. The
//!   `reqwest::Client` underneath is injected or built per `Client`, never
//!   global.
//! - Request building, status checking and decoding operate on the plain
//!   `HttpRequest` / `HttpResponse` values in [`http`], so they are testable
//!   without a server. Only `Client::send` does I/O.
//! - Every call takes a [`Context`] for cancellation and deadlines. One call
//!   is one round trip; retries belong to the caller.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod context;
pub mod error;
pub mod http;
pub mod inventory;
pub mod types;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use context::Context;
pub use error::{ApiError, Error, ErrorKind, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use inventory::{InventoryService, ListQuery};
pub use types::Inventory;

pub use tokio_util::sync::CancellationToken;
