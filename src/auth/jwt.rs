use std::collections::HashSet;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Deserialize;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig, store::User};

/// Only HMAC-SHA256 is ever issued or accepted.
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token")]
    Invalid,
    #[error("expired token")]
    Expired,
}

/// Issues and verifies identity tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Option<Duration>,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl: cfg.ttl_minutes.map(Duration::minutes),
        }
    }

    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            iat: now.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            exp: self.ttl.map(|ttl| (now + ttl).unix_timestamp() as usize),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = user.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        // jsonwebtoken reports `alg` values it has no variant for ("none")
        // as a parse error; they are still a wrong algorithm.
        if let Some(alg) = header_alg(token) {
            if alg.parse::<Algorithm>().ok() != Some(ALGORITHM) {
                debug!(%alg, "jwt with foreign algorithm");
                return Err(TokenError::Invalid);
            }
        }
        let data = decode::<Claims>(token, &self.decoding, &self.validation()).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidIssuer => TokenError::Invalid,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;
        debug!(user_id = data.claims.id, "jwt verified");
        Ok(data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let mut required: HashSet<String> = HashSet::from(["iss".to_string()]);
        match self.ttl {
            Some(_) => {
                required.insert("exp".into());
                validation.validate_exp = true;
            }
            None => validation.validate_exp = false,
        }
        validation.required_spec_claims = required;
        validation
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// `alg` of a three-segment token whose header is base64url JSON.
fn header_alg(token: &str) -> Option<String> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, _, _] = segments.as_slice() else {
        return None;
    };
    let mut buf = vec![0u8; header.len()];
    let json = Base64UrlUnpadded::decode(header.as_bytes(), &mut buf).ok()?;
    serde_json::from_slice::<RawHeader>(json).ok().map(|h| h.alg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, ttl_minutes: Option<i64>) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            issuer: "test-issuer".into(),
            ttl_minutes,
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            email: "a@x.com".into(),
            password_hash: "irrelevant".into(),
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            phone: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn claims_for(id: i64, iss: &str, exp: Option<usize>) -> Claims {
        Claims {
            id,
            email: "a@x.com".into(),
            firstname: String::new(),
            lastname: String::new(),
            iat: OffsetDateTime::now_utc().unix_timestamp() as usize,
            iss: iss.into(),
            exp,
        }
    }

    #[test]
    fn issue_and_verify() {
        let tokens = TokenService::new(&config("dev-secret", None));
        let token = tokens.issue(&user(42)).expect("issue");
        let claims = tokens.verify(&token).expect("verify");
        assert_eq!(claims.id, 42);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.firstname, "Ada");
        assert_eq!(claims.lastname, "Lovelace");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn ttl_adds_exp() {
        let tokens = TokenService::new(&config("dev-secret", Some(5)));
        let claims = tokens.verify(&tokens.issue(&user(1)).unwrap()).unwrap();
        let exp = claims.exp.expect("exp present");
        assert_eq!(exp - claims.iat, 5 * 60);
    }

    #[test]
    fn rejects_other_secret() {
        let issuer = TokenService::new(&config("secret-a", None));
        let verifier = TokenService::new(&config("secret-b", None));
        let token = issuer.issue(&user(1)).unwrap();
        assert_eq!(verifier.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn rejects_other_hmac_algorithm_with_same_secret() {
        let tokens = TokenService::new(&config("dev-secret", None));
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims_for(1, "test-issuer", None),
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn rejects_unsigned_token() {
        let tokens = TokenService::new(&config("dev-secret", None));
        // {"alg":"none","typ":"JWT"} . {"id":1,...} . <empty signature>
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJpZCI6MSwiZW1haWwiOiJhQHguY29tIiwiZmlyc3RuYW1lIjoiIiwibGFzdG5hbWUiOiIiLCJpYXQiOjAsImlzcyI6InRlc3QtaXNzdWVyIn0.";
        assert_eq!(tokens.verify(token), Err(TokenError::Invalid));
    }

    #[test]
    fn rejects_wrong_issuer() {
        let tokens = TokenService::new(&config("dev-secret", None));
        let token = encode(
            &Header::new(ALGORITHM),
            &claims_for(1, "someone-else", None),
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = TokenService::new(&config("dev-secret", None));
        assert_eq!(tokens.verify("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify(""), Err(TokenError::Malformed));
        assert_eq!(tokens.verify("abc.def.ghi"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify("e30.e30.sig"), Err(TokenError::Malformed));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let tokens = TokenService::new(&config("dev-secret", None));
        let token = tokens.issue(&user(1)).unwrap();
        let forged = tokens_with_payload(&token, &claims_for(2, "test-issuer", None));
        assert_eq!(tokens.verify(&forged), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_rejected_when_ttl_is_configured() {
        let tokens = TokenService::new(&config("dev-secret", Some(5)));
        let past = (OffsetDateTime::now_utc() - Duration::hours(1)).unix_timestamp() as usize;
        let token = encode(
            &Header::new(ALGORITHM),
            &claims_for(1, "test-issuer", Some(past)),
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_without_exp_is_refused_when_ttl_is_configured() {
        let no_ttl = TokenService::new(&config("dev-secret", None));
        let with_ttl = TokenService::new(&config("dev-secret", Some(5)));
        let token = no_ttl.issue(&user(1)).unwrap();
        assert_eq!(with_ttl.verify(&token), Err(TokenError::Malformed));
    }

    // Swaps the payload segment, keeping header and signature.
    fn tokens_with_payload(token: &str, claims: &Claims) -> String {
        let other = encode(
            &Header::new(ALGORITHM),
            claims,
            &EncodingKey::from_secret(b"unrelated"),
        )
        .unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let payload = other.split('.').nth(1).unwrap();
        parts[1] = payload;
        parts.join(".")
    }
}
