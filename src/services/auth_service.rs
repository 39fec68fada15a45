//! Admin authentication: a single shared password, exchanged for a signed
//! bearer token.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;

const ADMIN_SUBJECT: &str = "admin";
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct AuthService {
    password_hash: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthService {
    /// Hashes the configured admin password once; the plain text is not kept.
    pub fn new(admin_password: &str, secret_key: &str) -> Result<Self, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(admin_password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            password_hash,
            encoding: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(secret_key.as_bytes()),
            validation,
        })
    }

    pub fn verify_password(&self, candidate: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(&self.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;

        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(format!("Password verification failed: {}", e))),
        }
    }

    /// Checks the password and issues a token, or fails with `Unauthorized`.
    pub fn login(&self, candidate: &str) -> Result<String, AppError> {
        if !self.verify_password(candidate)? {
            warn!("🔒 Rejected admin login attempt");
            return Err(AppError::Unauthorized);
        }
        self.issue_token()
    }

    pub fn issue_token(&self) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: ADMIN_SUBJECT.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<AdminClaims, AppError> {
        let data = decode::<AdminClaims>(token, &self.decoding, &self.validation).map_err(|_| AppError::Forbidden)?;
        if data.claims.sub != ADMIN_SUBJECT {
            return Err(AppError::Forbidden);
        }
        Ok(data.claims)
    }
}
