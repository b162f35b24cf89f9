//! Digest response computation (RFC 2617 Section 3.2.2, RFC 7616 Section 3.4)
//!
//! Everything here is pure: the caller owns the nonce counter and the client
//! nonce, and persists any counter change itself.

use std::fmt;

use crate::types::{Algorithm, Credentials, DigestChallenge, Qop};

/// Per-request inputs to the digest computation.
#[derive(Debug, Clone, Copy)]
pub struct DigestRequest<'a> {
    pub method: &'a str,
    /// Path plus optional query, never scheme or host.
    pub uri: &'a str,
    pub body: Option<&'a [u8]>,
    pub nonce_count: u32,
    pub cnonce: &'a str,
}

/// Formats a nonce count as the 8 lower-case hex digits used on the wire.
pub fn format_nonce_count(nonce_count: u32) -> String {
    format!("{:08x}", nonce_count)
}

fn ha1(challenge: &DigestChallenge, credentials: &Credentials, cnonce: &str) -> String {
    let algorithm = challenge.algorithm;
    let base = algorithm.hash(
        format!(
            "{}:{}:{}",
            credentials.username, challenge.realm, credentials.password
        )
        .as_bytes(),
    );

    if algorithm.is_session() {
        algorithm.hash(format!("{}:{}:{}", base, challenge.nonce, cnonce).as_bytes())
    } else {
        base
    }
}

fn ha2(algorithm: Algorithm, qop: Option<Qop>, request: &DigestRequest<'_>) -> String {
    match qop {
        Some(Qop::AuthInt) => {
            let body_hash = algorithm.hash(request.body.unwrap_or_default());
            algorithm.hash(format!("{}:{}:{}", request.method, request.uri, body_hash).as_bytes())
        }
        _ => algorithm.hash(format!("{}:{}", request.method, request.uri).as_bytes()),
    }
}

/// Computes the `response` directive value for a request.
pub fn compute_response(
    challenge: &DigestChallenge,
    credentials: &Credentials,
    request: &DigestRequest<'_>,
) -> String {
    let algorithm = challenge.algorithm;
    let ha1 = ha1(challenge, credentials, request.cnonce);
    let ha2 = ha2(algorithm, challenge.qop, request);

    let input = match challenge.qop {
        Some(qop) => format!(
            "{}:{}:{}:{}:{}:{}",
            ha1,
            challenge.nonce,
            format_nonce_count(request.nonce_count),
            request.cnonce,
            qop,
            ha2
        ),
        None => format!("{}:{}:{}", ha1, challenge.nonce, ha2),
    };

    algorithm.hash(input.as_bytes())
}

/// Builds the full `Authorization` header for a request.
pub fn authorization_header(
    challenge: &DigestChallenge,
    credentials: &Credentials,
    request: &DigestRequest<'_>,
) -> AuthorizationHeader {
    let response = compute_response(challenge, credentials, request);
    let qop = challenge.qop.map(|qop| QopParams {
        qop,
        nonce_count: request.nonce_count,
        cnonce: request.cnonce.to_string(),
    });

    AuthorizationHeader {
        username: credentials.username.clone(),
        realm: challenge.realm.clone(),
        nonce: challenge.nonce.clone(),
        uri: request.uri.to_string(),
        algorithm: challenge.algorithm,
        opaque: challenge.opaque.clone(),
        qop,
        response,
    }
}

/// The `nc`/`qop`/`cnonce` triple, present only when the challenge set qop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QopParams {
    pub qop: Qop,
    pub nonce_count: u32,
    pub cnonce: String,
}

/// Typed `Authorization: Digest ...` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    pub username: String,
    pub realm: String,
    pub nonce: String,
    pub uri: String,
    pub algorithm: Algorithm,
    pub opaque: Option<String>,
    pub qop: Option<QopParams>,
    pub response: String,
}

impl AuthorizationHeader {
    pub fn nonce_count(&self) -> Option<u32> {
        self.qop.as_ref().map(|params| params.nonce_count)
    }
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for AuthorizationHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest username=\"{}\"", quote(&self.username))?;
        write!(f, ", realm=\"{}\"", quote(&self.realm))?;
        write!(f, ", nonce=\"{}\"", quote(&self.nonce))?;
        write!(f, ", uri=\"{}\"", quote(&self.uri))?;
        write!(f, ", algorithm={}", self.algorithm)?;

        if let Some(opaque) = &self.opaque {
            write!(f, ", opaque=\"{}\"", quote(opaque))?;
        }
        if let Some(params) = &self.qop {
            // qop value is not quoted here
            write!(
                f,
                ", nc={}, qop={}, cnonce=\"{}\"",
                format_nonce_count(params.nonce_count),
                params.qop,
                params.cnonce
            )?;
        }

        write!(f, ", response=\"{}\"", self.response)
    }
}
