//! Two-step confirmation for returns
//!
//! A return is proposed first, yielding a single-use token; the commit call
//! must present that token. Tokens expire after a configurable TTL and are
//! consumed on redemption, successful or not.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::RngCore;

use crate::error::{AppError, AppResult};

pub struct ConfirmService {
    ttl: Duration,
    pending: Mutex<HashMap<String, PendingReturn>>,
}

struct PendingReturn {
    transaction_id: i64,
    issued_at: Instant,
}

impl ConfirmService {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a confirm token for returning the given transaction
    pub fn issue(&self, transaction_id: i64) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let mut pending = self.pending.lock().unwrap();
        pending.retain(|_, p| p.issued_at.elapsed() < self.ttl);
        pending.insert(
            token.clone(),
            PendingReturn {
                transaction_id,
                issued_at: Instant::now(),
            },
        );

        token
    }

    /// Redeem a token, consuming it; fails if unknown, expired, or issued
    /// for a different transaction
    pub fn redeem(&self, token: &str, transaction_id: i64) -> AppResult<()> {
        let mut pending = self.pending.lock().unwrap();

        let entry = pending
            .remove(token)
            .ok_or_else(|| AppError::Confirmation("Unknown confirm token".to_string()))?;

        if entry.issued_at.elapsed() >= self.ttl {
            return Err(AppError::Confirmation("Confirm token expired".to_string()));
        }
        if entry.transaction_id != transaction_id {
            return Err(AppError::Confirmation(
                "Confirm token was issued for a different transaction".to_string(),
            ));
        }

        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_single_use() {
        let confirm = ConfirmService::new(Duration::from_secs(60));
        let token = confirm.issue(7);

        assert!(confirm.redeem(&token, 7).is_ok());
        assert!(confirm.redeem(&token, 7).is_err());
    }

    #[test]
    fn token_is_bound_to_its_transaction() {
        let confirm = ConfirmService::new(Duration::from_secs(60));
        let token = confirm.issue(7);

        assert!(confirm.redeem(&token, 8).is_err());
        // A mismatched redemption still consumes the token
        assert!(confirm.redeem(&token, 7).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let confirm = ConfirmService::new(Duration::from_millis(1));
        let token = confirm.issue(7);

        std::thread::sleep(Duration::from_millis(5));
        assert!(confirm.redeem(&token, 7).is_err());
    }

    #[test]
    fn unknown_token_is_rejected() {
        let confirm = ConfirmService::new(Duration::from_secs(60));
        assert!(confirm.redeem("deadbeef", 1).is_err());
    }
}
