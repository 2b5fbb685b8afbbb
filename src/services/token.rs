use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::Cookie;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// The name of the session cookie.
pub const SESSION_COOKIE: &str = "jwt";

/// Session lifetime: exactly one day.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// The signed, self-contained session assertion.
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    /// The user id the token asserts.
    pub sub: Uuid,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Issues a signed token asserting `user_id`, expiring one day out.
pub fn issue(user_id: Uuid, secret: &[u8]) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AppError::Internal(format!("Token signing failed: {e}")))
}

/// Verifies a token and returns its claims.
///
/// Expired tokens are distinguished from otherwise-invalid ones for logging;
/// both map to the same 401 outcome.
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::Unauthorized("Token verification failed".to_string()),
    })
}

/// Shared attribute set for the session cookie. Issue and clear must agree on
/// every attribute or browsers silently refuse to remove the cookie.
fn base_cookie(value: String, production: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_path("/");

    if production {
        cookie.set_same_site(SameSite::None);
        cookie.set_secure(true);
    } else {
        cookie.set_same_site(SameSite::Lax);
    }

    cookie
}

/// Builds the session cookie carrying a freshly issued token.
pub fn session_cookie(token: String, production: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(token, production);
    cookie.set_max_age(Duration::seconds(TOKEN_TTL_SECS));
    cookie
}

/// Builds the removal cookie used at logout, with attribute parity to
/// issuance.
pub fn removal_cookie(production: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(String::new(), production);
    cookie.set_max_age(Duration::seconds(0));
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn issued_token_verifies_to_the_same_identity() {
        let user_id = Uuid::new_v4();
        let token = issue(user_id, SECRET).unwrap();
        let claims = verify(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issue(Uuid::new_v4(), SECRET).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');

        assert!(matches!(
            verify(&tampered, SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = issue(Uuid::new_v4(), b"other-secret").unwrap();
        assert!(matches!(
            verify(&token, SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now - 2 * TOKEN_TTL_SECS,
            exp: now - TOKEN_TTL_SECS,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(verify(&token, SECRET), Err(AppError::TokenExpired)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify("not-a-token", SECRET).is_err());
    }

    #[test]
    fn session_cookie_attributes_match_between_issue_and_clear() {
        for production in [false, true] {
            let issued = session_cookie("token".to_string(), production);
            let cleared = removal_cookie(production);

            assert_eq!(issued.name(), SESSION_COOKIE);
            assert_eq!(issued.http_only(), cleared.http_only());
            assert_eq!(issued.same_site(), cleared.same_site());
            assert_eq!(issued.secure(), cleared.secure());
            assert_eq!(issued.path(), cleared.path());
            assert_eq!(cleared.max_age(), Some(Duration::seconds(0)));
        }
    }

    #[test]
    fn production_cookie_is_secure_cross_site() {
        let cookie = session_cookie("token".to_string(), true);
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));

        let cookie = session_cookie("token".to_string(), false);
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_ne!(cookie.secure(), Some(true));
    }
}
