//! Digest session state: the held challenge and its nonce counter.
//!
//! An [`AuthSession`] is created once per credential pair and shared (usually
//! behind an `Arc`) by everything issuing requests to the same camera. Both
//! mutating operations run under one lock so concurrent requests never emit
//! the same `nc` twice.

use parking_lot::Mutex;
use rand::RngCore;
use tracing::{debug, trace};

use crate::challenge::parse_challenge;
use crate::error::{AuthError, Result};
use crate::response::{authorization_header, AuthorizationHeader, DigestRequest};
use crate::types::{Credentials, DigestChallenge};

const CNONCE_BYTES: usize = 16;

#[derive(Debug)]
struct SessionState {
    challenge: Option<DigestChallenge>,
    nonce_count: u32,
}

/// Digest authentication session for one credential pair.
#[derive(Debug)]
pub struct AuthSession {
    credentials: Credentials,
    state: Mutex<SessionState>,
}

/// 16 random bytes, hex-encoded. Regenerated for every produced header.
pub fn generate_cnonce() -> String {
    let mut bytes = [0u8; CNONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl AuthSession {
    pub fn new(credentials: Credentials) -> Self {
        AuthSession {
            credentials,
            state: Mutex::new(SessionState {
                challenge: None,
                nonce_count: 1,
            }),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Replaces the held challenge.
    ///
    /// The nonce counter restarts at 1 only for a brand-new nonce. A 401 that
    /// re-issues the nonce already held (a rotated `opaque`, or `stale=true`
    /// with the same nonce) keeps counting: servers track `nc` per nonce and
    /// reject a value they have already seen, so restarting at 1 there would
    /// replay `nc=00000001`.
    pub fn absorb_challenge(&self, challenge: DigestChallenge) {
        let mut state = self.state.lock();

        let same_nonce = state
            .challenge
            .as_ref()
            .is_some_and(|held| held.nonce == challenge.nonce);
        if !same_nonce {
            state.nonce_count = 1;
        }

        debug!(
            realm = %challenge.realm,
            algorithm = %challenge.algorithm,
            stale = challenge.stale,
            new_nonce = !same_nonce,
            "Absorbed digest challenge"
        );
        state.challenge = Some(challenge);
    }

    /// Parses a `WWW-Authenticate` value and absorbs it.
    pub fn absorb_header(&self, www_authenticate: &str) -> Result<()> {
        let challenge = parse_challenge(www_authenticate)?;
        self.absorb_challenge(challenge);
        Ok(())
    }

    /// Produces the `Authorization` header for one request.
    ///
    /// Fails with [`AuthError::NotAuthenticated`] when no challenge is held.
    /// When the challenge carries qop the counter advances by one, wrapping
    /// from `0xFFFFFFFF` back to 1.
    pub fn produce_header(
        &self,
        method: &str,
        uri: &str,
        body: Option<&[u8]>,
    ) -> Result<AuthorizationHeader> {
        let mut state = self.state.lock();
        let challenge = state.challenge.as_ref().ok_or(AuthError::NotAuthenticated)?;

        let cnonce = generate_cnonce();
        let request = DigestRequest {
            method,
            uri,
            body,
            nonce_count: state.nonce_count,
            cnonce: &cnonce,
        };
        let header = authorization_header(challenge, &self.credentials, &request);

        if challenge.qop.is_some() {
            trace!(nc = state.nonce_count, uri, "Produced digest header");
            state.nonce_count = match state.nonce_count {
                u32::MAX => 1,
                n => n + 1,
            };
        }

        Ok(header)
    }

    /// Drops the held challenge, returning the session to unauthenticated.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.challenge = None;
        state.nonce_count = 1;
        debug!("Digest session reset");
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().challenge.is_some()
    }

    /// Counter value the next produced header will carry.
    pub fn nonce_count(&self) -> u32 {
        self.state.lock().nonce_count
    }

    pub fn challenge(&self) -> Option<DigestChallenge> {
        self.state.lock().challenge.clone()
    }

    #[cfg(test)]
    pub(crate) fn force_nonce_count(&self, nonce_count: u32) {
        self.state.lock().nonce_count = nonce_count;
    }
}
