//! # Auth-Core - HTTP Digest authentication for camera control clients
//!
//! This crate implements the RFC 2617/7616 Digest handshake used by cameras
//! that expose their control API over plain HTTP(S) without any modern
//! authentication scheme:
//!
//! - [`challenge`] parses `WWW-Authenticate: Digest ...` values
//! - [`response`] computes the `Authorization` header (pure)
//! - [`session`] holds the challenge and the nonce counter under one lock
//! - [`client`] drives the 401 handshake and bounded retries around any
//!   [`RequestExecutor`]
//! - [`http`] provides the reqwest-backed executor

pub mod challenge;
pub mod client;
pub mod error;
pub mod http;
pub mod response;
pub mod session;
pub mod types;

pub use challenge::{parse_challenge, parse_directives};
pub use client::{
    AuthClientConfig, CameraRequest, CameraResponse, DigestClient, RequestExecutor,
    DEFAULT_MAX_RETRIES,
};
pub use error::{AuthError, Result};
pub use http::{HttpConfig, ReqwestExecutor};
pub use response::{authorization_header, compute_response, AuthorizationHeader, DigestRequest};
pub use session::AuthSession;
pub use types::{Algorithm, Credentials, DigestChallenge, Qop};

pub use reqwest::Method;
pub use url::Url;
