use crate::config::AuthConfig;
use crate::requests::MethodRequest;
use chrono::{DateTime, Local, TimeZone};
use sha2::{Digest, Sha512};

fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

/// Token the admin caller must present during the given hour.
pub fn admin_token<Tz: TimeZone>(now: &DateTime<Tz>, admin_salt: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    sha512_hex(&format!("{}{admin_salt}", now.format("%Y%m%d%H")))
}

pub fn user_token(account: &str, login: &str, salt: &str) -> String {
    sha512_hex(&format!("{account}{login}{salt}"))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Checks the token of a request against the one derived from its identity.
///
/// Missing account, login or token are treated as empty strings.
pub fn check_auth(request: &MethodRequest, config: &AuthConfig) -> bool {
    check_auth_at(request, config, &Local::now())
}

fn check_auth_at<Tz: TimeZone>(
    request: &MethodRequest,
    config: &AuthConfig,
    now: &DateTime<Tz>,
) -> bool
where
    Tz::Offset: std::fmt::Display,
{
    let expected = if request.is_admin() {
        admin_token(now, &config.admin_salt)
    } else {
        user_token(
            request.account.as_deref().unwrap_or_default(),
            request.login.as_deref().unwrap_or_default(),
            &config.salt,
        )
    };
    let token = request.token.as_deref().unwrap_or_default();
    constant_time_eq(expected.as_bytes(), token.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::Map;

    fn request(account: Option<&str>, login: &str, token: &str) -> MethodRequest {
        MethodRequest {
            account: account.map(Into::into),
            login: Some(login.into()),
            token: Some(token.into()).filter(|t: &String| !t.is_empty()),
            arguments: Map::new(),
            method: "online_score".into(),
        }
    }

    #[test]
    fn test_user_token() {
        let config = AuthConfig::default();
        let token = user_token("horns&hoofs", "h&f", "Otus");
        assert_eq!(token.len(), 128);
        assert!(check_auth(&request(Some("horns&hoofs"), "h&f", &token), &config));
        assert!(!check_auth(&request(Some("horns&hoofs"), "h&f", "sdd"), &config));
        assert!(!check_auth(&request(Some("horns&hoofs"), "h&f", ""), &config));
        assert!(!check_auth(&request(Some("other"), "h&f", &token), &config));
    }

    #[test]
    fn test_missing_account_is_empty() {
        let token = user_token("", "h&f", "Otus");
        assert!(check_auth(&request(None, "h&f", &token), &AuthConfig::default()));
    }

    #[test]
    fn test_admin_token_rotates_hourly() {
        let config = AuthConfig::default();
        let now = Utc::now();
        let token = admin_token(&now, "42");
        let admin = request(None, "admin", &token);

        assert!(check_auth_at(&admin, &config, &now));
        assert!(!check_auth_at(&admin, &config, &(now + Duration::hours(1))));
        // A regular user cannot borrow the admin token.
        assert!(!check_auth_at(&request(None, "h&f", &token), &config, &now));
    }

    #[test]
    fn test_admin_token_format() {
        let at = Utc.with_ymd_and_hms(2017, 7, 19, 13, 5, 0).unwrap();
        assert_eq!(admin_token(&at, "42"), sha512_hex("201707191342"));
    }
}
