use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::Claims;
use crate::{
    config::AuthConfig,
    error::{AppError, AuthError},
};

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

pub fn now_unix() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Issues and checks HS256 session tokens bound to an admin email.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: JwtKeys,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            keys: JwtKeys::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(
            cfg.jwt_secret.as_bytes(),
            Duration::from_secs(cfg.access_token_ttl_minutes.saturating_mul(60)),
        )
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs()
    }

    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        self.issue_at(subject, now_unix())
    }

    pub fn issue_at(&self, subject: &str, now: u64) -> Result<String, AppError> {
        let claims = Claims {
            sub: Some(subject.to_string()),
            iat: now,
            exp: now.saturating_add(self.ttl_secs()),
        };
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());

        encode(&header, &claims, &self.keys.enc)
            .map_err(|err| AppError::internal(format!("Token encoding failed: {err}")))
    }

    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        self.validate_at(token, now_unix())
    }

    /// Returns the subject of a token that is still valid at `now`.
    ///
    /// Expiry is checked here with zero leeway rather than by the decoder, so a
    /// token rejected at some instant stays rejected at every later one.
    pub fn validate_at(&self, token: &str, now: u64) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.keys.dec, &validation)
            .map_err(|_| AuthError::Malformed)?
            .claims;

        if now >= claims.exp {
            return Err(AuthError::Expired);
        }

        match claims.sub {
            Some(sub) if !sub.trim().is_empty() => Ok(sub),
            _ => Err(AuthError::MissingSubject),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jsonwebtoken::{Algorithm, Header, encode};

    use super::{JwtKeys, TokenIssuer};
    use crate::{auth::Claims, error::AuthError};

    const SECRET: &[u8] = b"unit-test-secret-value";
    const NOW: u64 = 1_767_225_600;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, Duration::from_secs(30 * 60))
    }

    fn sign(claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &JwtKeys::from_secret(SECRET).enc,
        )
        .expect("token should encode")
    }

    #[test]
    fn issued_token_validates_to_its_subject() {
        let issuer = issuer();
        let token = issuer
            .issue_at("root@example.com", NOW)
            .expect("token should encode");

        assert_eq!(
            issuer.validate_at(&token, NOW + 60),
            Ok("root@example.com".to_string())
        );
    }

    #[test]
    fn expires_at_ttl_and_stays_expired() {
        let issuer = issuer();
        let token = issuer
            .issue_at("root@example.com", NOW)
            .expect("token should encode");
        let ttl = issuer.ttl_secs();

        assert!(issuer.validate_at(&token, NOW + ttl - 1).is_ok());
        for later in [NOW + ttl, NOW + ttl + 1, NOW + ttl * 10] {
            assert_eq!(issuer.validate_at(&token, later), Err(AuthError::Expired));
        }
    }

    #[test]
    fn foreign_signature_is_malformed() {
        let other = TokenIssuer::new(b"another-secret-value", Duration::from_secs(60));
        let token = other
            .issue_at("root@example.com", NOW)
            .expect("token should encode");

        assert_eq!(issuer().validate_at(&token, NOW), Err(AuthError::Malformed));
        assert_eq!(
            issuer().validate_at("not-a-token", NOW),
            Err(AuthError::Malformed)
        );
    }

    #[test]
    fn blank_or_missing_subject_is_rejected() {
        for sub in [None, Some("   ".to_string())] {
            let token = sign(&Claims {
                sub,
                iat: NOW,
                exp: NOW + 60,
            });

            assert_eq!(
                issuer().validate_at(&token, NOW),
                Err(AuthError::MissingSubject)
            );
        }
    }

    #[test]
    fn token_without_iat_is_accepted() {
        #[derive(serde::Serialize)]
        struct SubAndExp<'a> {
            sub: &'a str,
            exp: u64,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &SubAndExp {
                sub: "root@example.com",
                exp: NOW + 600,
            },
            &JwtKeys::from_secret(SECRET).enc,
        )
        .expect("token should encode");

        assert_eq!(
            issuer().validate_at(&token, NOW),
            Ok("root@example.com".to_string())
        );
    }

    #[test]
    fn token_without_exp_is_malformed() {
        #[derive(serde::Serialize)]
        struct NoExp<'a> {
            sub: &'a str,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExp {
                sub: "root@example.com",
            },
            &JwtKeys::from_secret(SECRET).enc,
        )
        .expect("token should encode");

        assert_eq!(issuer().validate_at(&token, NOW), Err(AuthError::Malformed));
    }
}
