//! # Wharf Transport
//!
//! This crate provides the authenticated HTTP transport wharf uses to talk
//! to a document server's management and REST APIs.
//!
//! ## Features
//!
//! - **Digest Authentication**: Transparent RFC 2617 challenge/response with
//!   bounded retry
//! - **Multipart Encoding**: Binary `multipart/mixed` payloads for bulk
//!   document uploads
//! - **Restart Polling**: Readiness detection via the admin timestamp
//!   endpoint
//! - **Pluggable Credentials**: Static or interactive password sources
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Transport Layer                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  DigestClient ──► DigestChallenge ──► Authorization header      │
//! │       │                                      ▲                  │
//! │       ▼                                      │                  │
//! │  CredentialProvider (static / prompt) ───────┘                  │
//! │                                                                 │
//! │  Multipart (payload encoding)    RestartPoller (readiness)      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod credentials;
pub mod digest;
pub mod error;
pub mod multipart;
pub mod restart;

pub use client::{DigestClient, HttpResponse, RequestBody, RequestParams, ResponseBody};
pub use credentials::{CredentialProvider, PromptCredentials, StaticCredentials};
pub use digest::DigestChallenge;
pub use error::{Result, TransportError};
pub use multipart::{Multipart, random_boundary};
pub use reqwest::StatusCode;
pub use restart::RestartPoller;
