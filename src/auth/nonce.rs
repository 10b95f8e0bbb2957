//! Short-lived per-user action tokens guarding state-changing requests.
//!
//! A token is the HMAC-SHA256 of `action|user_id|tick`, hex encoded and cut
//! to 20 characters. The tick advances every half lifetime, and a token is
//! accepted for the tick it was issued in and the one after.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::config;

type HmacSha256 = Hmac<Sha256>;

pub const ACTION_PREFIX: &str = "ep_";
const TOKEN_BYTES: usize = 10;

pub const SAVE_EMPLOYEE: &str = "save_employee";
pub const DELETE_EMPLOYEE: &str = "delete_employee";
pub const UPLOAD_DOCUMENT: &str = "upload_document";
pub const DELETE_DOCUMENT: &str = "delete_document";
pub const TIME_OFF: &str = "time_off";
pub const APPROVE_TIME_OFF: &str = "approve_time_off";
pub const SAVE_ANNOUNCEMENT: &str = "save_announcement";
pub const DELETE_ANNOUNCEMENT: &str = "delete_announcement";
pub const SAVE_SCHEDULE: &str = "save_schedule";
pub const DELETE_SCHEDULE: &str = "delete_schedule";
pub const MANAGE_USERS: &str = "manage_users";

pub const ACTIONS: &[&str] = &[
    SAVE_EMPLOYEE,
    DELETE_EMPLOYEE,
    UPLOAD_DOCUMENT,
    DELETE_DOCUMENT,
    TIME_OFF,
    APPROVE_TIME_OFF,
    SAVE_ANNOUNCEMENT,
    DELETE_ANNOUNCEMENT,
    SAVE_SCHEDULE,
    DELETE_SCHEDULE,
    MANAGE_USERS,
];

/// Strip the optional `ep_` prefix and check the action is one we issue for
pub fn known_action(action: &str) -> Option<&'static str> {
    let bare = action.strip_prefix(ACTION_PREFIX).unwrap_or(action);
    ACTIONS.iter().copied().find(|a| *a == bare)
}

pub struct NonceKey<'a> {
    secret: &'a [u8],
    half_life_secs: i64,
}

impl NonceKey<'static> {
    pub fn from_config() -> Self {
        let security = &config::config().security;
        Self::new(security.jwt_secret.as_bytes(), security.nonce_lifetime_hours as i64 * 3600)
    }
}

impl<'a> NonceKey<'a> {
    pub fn new(secret: &'a [u8], lifetime_secs: i64) -> Self {
        Self {
            secret,
            half_life_secs: (lifetime_secs / 2).max(1),
        }
    }

    fn tick(&self, now: i64) -> i64 {
        (now + self.half_life_secs - 1) / self.half_life_secs
    }

    fn mac(&self, user_id: Uuid, action: &str, tick: i64) -> Option<HmacSha256> {
        let bare = action.strip_prefix(ACTION_PREFIX).unwrap_or(action);
        let mut mac = HmacSha256::new_from_slice(self.secret).ok()?;
        mac.update(format!("{}{}|{}|{}", ACTION_PREFIX, bare, user_id, tick).as_bytes());
        Some(mac)
    }

    pub fn create_at(&self, user_id: Uuid, action: &str, now: i64) -> String {
        match self.mac(user_id, action, self.tick(now)) {
            Some(mac) => hex::encode(&mac.finalize().into_bytes()[..TOKEN_BYTES]),
            None => String::new(),
        }
    }

    /// `Some(1)` when issued in the current tick, `Some(2)` when issued in the previous one
    pub fn verify_at(&self, token: &str, user_id: Uuid, action: &str, now: i64) -> Option<u8> {
        let bytes = hex::decode(token.trim()).ok()?;
        if bytes.len() != TOKEN_BYTES {
            return None;
        }
        let tick = self.tick(now);
        for (age, t) in [(1u8, tick), (2u8, tick - 1)] {
            if let Some(mac) = self.mac(user_id, action, t) {
                if mac.verify_truncated_left(&bytes).is_ok() {
                    return Some(age);
                }
            }
        }
        None
    }
}

pub fn create_nonce(user_id: Uuid, action: &str) -> String {
    NonceKey::from_config().create_at(user_id, action, chrono::Utc::now().timestamp())
}

pub fn verify_nonce(token: &str, user_id: Uuid, action: &str) -> Option<u8> {
    NonceKey::from_config().verify_at(token, user_id, action, chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;

    fn key() -> NonceKey<'static> {
        NonceKey::new(b"nonce-test-secret-with-enough-length", DAY)
    }

    #[test]
    fn token_shape() {
        let token = key().create_at(Uuid::new_v4(), "time_off", 1_700_000_000);
        assert_eq!(token.len(), 20);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fresh_token_verifies_as_current_tick() {
        let user = Uuid::new_v4();
        let now = 1_700_000_000;
        let token = key().create_at(user, "upload_document", now);
        assert_eq!(key().verify_at(&token, user, "upload_document", now), Some(1));
        // Prefixed and bare action names are the same action
        assert_eq!(key().verify_at(&token, user, "ep_upload_document", now), Some(1));
    }

    #[test]
    fn token_ages_then_expires() {
        let user = Uuid::new_v4();
        let now = 1_700_000_000;
        let token = key().create_at(user, "time_off", now);
        assert_eq!(key().verify_at(&token, user, "time_off", now + DAY / 2), Some(2));
        assert_eq!(key().verify_at(&token, user, "time_off", now + DAY + 1), None);
    }

    #[test]
    fn token_is_bound_to_user_and_action() {
        let user = Uuid::new_v4();
        let now = 1_700_000_000;
        let token = key().create_at(user, "time_off", now);
        assert_eq!(key().verify_at(&token, Uuid::new_v4(), "time_off", now), None);
        assert_eq!(key().verify_at(&token, user, "delete_document", now), None);
        assert_eq!(key().verify_at("not-hex", user, "time_off", now), None);
        assert_eq!(key().verify_at("", user, "time_off", now), None);
    }

    #[test]
    fn known_actions() {
        assert_eq!(known_action("ep_time_off"), Some(TIME_OFF));
        assert_eq!(known_action("manage_users"), Some(MANAGE_USERS));
        assert_eq!(known_action("drop_tables"), None);
    }
}
