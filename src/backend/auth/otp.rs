//! One-time codes for email verification and password reset.
//!
//! Codes live in a bounded LRU cache behind an async mutex: at most
//! [`OTP_CAPACITY`] outstanding codes, each valid for [`OTP_TTL`]. Issuing a
//! new code for the same `(purpose, email)` replaces the old one; a code is
//! removed once it has been used successfully.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

pub const OTP_CAPACITY: usize = 10_000;
pub const OTP_TTL: Duration = Duration::from_secs(10 * 60);

/// What a code may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtpPurpose {
    VerifyEmail,
    ResetPassword,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    /// No live code for this email and purpose
    #[error("no OTP found for this email")]
    Missing,
    #[error("invalid OTP")]
    Mismatch,
}

struct OtpEntry {
    code: String,
    issued_at: Instant,
}

#[derive(Clone)]
pub struct OtpStore {
    entries: Arc<Mutex<LruCache<(OtpPurpose, String), OtpEntry>>>,
    ttl: Duration,
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new(OTP_CAPACITY, OTP_TTL)
    }
}

impl OtpStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
        }
    }

    /// Generate and store a fresh six-digit code
    pub async fn issue(&self, purpose: OtpPurpose, email: &str) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.entries.lock().await.put(
            (purpose, email.to_lowercase()),
            OtpEntry {
                code: code.clone(),
                issued_at: Instant::now(),
            },
        );
        code
    }

    /// Check `code` and remove it on success
    ///
    /// A wrong code leaves the stored one in place; an expired one is dropped.
    pub async fn consume(&self, purpose: OtpPurpose, email: &str, code: &str) -> Result<(), OtpError> {
        let key = (purpose, email.to_lowercase());
        let mut entries = self.entries.lock().await;

        let expired = match entries.get(&key) {
            None => return Err(OtpError::Missing),
            Some(entry) => entry.issued_at.elapsed() > self.ttl,
        };
        if expired {
            entries.pop(&key);
            return Err(OtpError::Missing);
        }

        match entries.peek(&key) {
            Some(entry) if entry.code == code.trim() => {
                entries.pop(&key);
                Ok(())
            }
            _ => Err(OtpError::Mismatch),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
