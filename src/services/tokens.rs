//! Token validity rules.
//!
//! The two token kinds age differently. Confirmation tokens die at the
//! exact stored instant. Password reset tokens are judged at calendar-day
//! granularity: the token stays usable while its expiry date is at least
//! one full day ahead of today, so a token issued late in the evening is
//! still good the whole next day.

use chrono::{DateTime, Utc};

use crate::entities::{confirmation_tokens, password_reset_tokens};

/// Outcome of checking a token, kept as a tag so callers and logs can
/// distinguish a replay from a typo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    NotFound,
    Expired,
    AlreadyUsed,
}

impl TokenStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::AlreadyUsed => "already_used",
        }
    }
}

/// A confirmation token is dead the moment `now` reaches its expiry.
#[must_use]
pub fn confirmation_is_expired(
    token: &confirmation_tokens::Model,
    now: DateTime<Utc>,
) -> bool {
    token.expiry_date <= now
}

/// Reset-token age at calendar-day granularity: dead once its expiry date
/// is no longer at least one full day ahead of today.
#[must_use]
pub fn reset_is_expired(token: &password_reset_tokens::Model, now: DateTime<Utc>) -> bool {
    (token.expiry_date.date_naive() - now.date_naive()).num_days() < 1
}

#[must_use]
pub fn reset_token_status(
    token: &password_reset_tokens::Model,
    now: DateTime<Utc>,
) -> TokenStatus {
    if token.used {
        return TokenStatus::AlreadyUsed;
    }

    if reset_is_expired(token, now) {
        return TokenStatus::Expired;
    }

    TokenStatus::Valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn confirmation(expiry: DateTime<Utc>) -> confirmation_tokens::Model {
        confirmation_tokens::Model {
            id: 1,
            token: "t".to_string(),
            user_id: 1,
            expiry_date: expiry,
        }
    }

    fn reset(expiry: DateTime<Utc>, used: bool) -> password_reset_tokens::Model {
        password_reset_tokens::Model {
            id: 1,
            token: "t".to_string(),
            user_id: 1,
            expiry_date: expiry,
            used,
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn confirmation_valid_before_expiry() {
        let now = at(2026, 3, 10, 12, 0);
        let token = confirmation(at(2026, 3, 11, 12, 0));
        assert!(!confirmation_is_expired(&token, now));
    }

    #[test]
    fn confirmation_expired_at_exact_instant() {
        let now = at(2026, 3, 11, 12, 0);
        let token = confirmation(now);
        assert!(confirmation_is_expired(&token, now));
    }

    #[test]
    fn confirmation_expired_after_instant() {
        let now = at(2026, 3, 11, 12, 0);
        let token = confirmation(at(2026, 3, 11, 11, 59));
        assert!(confirmation_is_expired(&token, now));
    }

    #[test]
    fn reset_valid_while_expiry_is_tomorrow() {
        // Issued 23:00, expiry 23:00 the next day: still a full calendar
        // day ahead for the rest of the issue day.
        let now = at(2026, 3, 10, 23, 30);
        let token = reset(at(2026, 3, 11, 23, 0), false);
        assert_eq!(reset_token_status(&token, now), TokenStatus::Valid);
    }

    #[test]
    fn reset_expired_on_expiry_day() {
        // Day granularity: once today equals the expiry day the token is
        // already gone, even though the stored instant is hours away.
        let now = at(2026, 3, 11, 1, 0);
        let token = reset(at(2026, 3, 11, 23, 0), false);
        assert_eq!(reset_token_status(&token, now), TokenStatus::Expired);
    }

    #[test]
    fn reset_used_wins_over_expiry() {
        let now = at(2026, 3, 10, 12, 0);
        let token = reset(at(2026, 3, 11, 12, 0), true);
        assert_eq!(reset_token_status(&token, now), TokenStatus::AlreadyUsed);
    }

    #[test]
    fn reset_expiry_ignores_the_used_flag() {
        // The bare age check only looks at dates; a spent token that has
        // not aged out is still within its window.
        let now = at(2026, 3, 10, 12, 0);
        assert!(!reset_is_expired(&reset(at(2026, 3, 11, 12, 0), true), now));
        assert!(reset_is_expired(&reset(at(2026, 3, 10, 23, 0), true), now));
    }
}
