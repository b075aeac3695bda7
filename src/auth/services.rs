use axum::extract::FromRef;
use jsonwebtoken::{decode, DecodingKey, Validation};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::claims::{SessionClaims, SessionUser};
use crate::config::SessionConfig;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Verification keys for identity-provider session tokens.
#[derive(Clone)]
pub struct JwtKeys {
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.session)
    }
}

impl From<&SessionConfig> for JwtKeys {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }
}

impl JwtKeys {
    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        debug!(sub = ?data.claims.sub, "session token verified");
        Ok(data.claims)
    }

    /// Verifies the token and resolves the identity it carries.
    pub fn identify(&self, token: &str) -> anyhow::Result<SessionUser> {
        let claims = self.verify(token)?;
        let email = claims
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| is_valid_email(e))
            .ok_or_else(|| anyhow::anyhow!("session carries no valid email"))?;
        Ok(SessionUser {
            email,
            name: claims.name.unwrap_or_default(),
            image: claims.picture.unwrap_or_default(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_tokens::sign;
    use super::*;

    fn cfg(issuer: &str, audience: &str) -> SessionConfig {
        SessionConfig {
            secret: "dev-secret".into(),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    #[test]
    fn identify_normalizes_email() {
        let cfg = cfg("iss", "aud");
        let token = sign(&cfg, Some("  Alice@Example.COM "), 300);
        let user = JwtKeys::from(&cfg).identify(&token).expect("identify");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.name, "Test User");
        assert_eq!(user.image, "https://img.example/u.png");
    }

    #[test]
    fn identify_requires_email() {
        let cfg = cfg("iss", "aud");
        let token = sign(&cfg, None, 300);
        assert!(JwtKeys::from(&cfg).identify(&token).is_err());
        let token = sign(&cfg, Some("not-an-email"), 300);
        assert!(JwtKeys::from(&cfg).identify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let token = sign(&cfg("good-iss", "good-aud"), Some("a@b.io"), 300);
        assert!(JwtKeys::from(&cfg("bad-iss", "good-aud")).verify(&token).is_err());
        assert!(JwtKeys::from(&cfg("good-iss", "bad-aud")).verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let cfg = cfg("iss", "aud");
        let token = sign(&cfg, Some("a@b.io"), -3600);
        assert!(JwtKeys::from(&cfg).verify(&token).is_err());
    }

    #[test]
    fn email_regex() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("us er@example.com"));
    }
}
