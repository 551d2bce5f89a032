//! # File Service Provider
//!
//! Implements the `RemoteStore` trait against the self-hosted file service
//! exposed by the desktop shell.
//!
//! ## Overview
//!
//! This module provides:
//! - Full remote listing via `GET /files`
//! - Multipart uploads via `POST /files` with server-side duplicate
//!   acknowledgment
//! - Binary downloads via `GET /files/{filename}`
//! - Bearer token and `X-Device-UUID` identity headers on every call
//! - Exponential backoff for rate limiting and server errors

pub mod client;
pub mod error;
pub mod types;

pub use client::FileServerClient;
pub use error::{FileServerError, Result};
pub use types::{FileEntry, FilesListResponse, UploadResponse};
