//! Authenticator: create-or-verify login and signed identity assertions.
//!
//! # Responsibility
//! - Register unknown usernames on first login with a hashed credential.
//! - Verify known usernames against their stored Argon2id hash.
//! - Issue and verify HS256 tokens carrying the caller identity.
//!
//! # Invariants
//! - Plaintext passwords and tokens are never logged.
//! - A lost registration race falls back to credential verification.
//! - The ledger trusts only `Caller` values produced by `verify_token`.

use crate::config::{AuthConfig, ConfigError, PasswordHashingConfig};
use crate::error::{LedgerError, LedgerResult};
use crate::model::account::{is_valid_username, Account, AccountId};
use crate::repo::account_repo::{AccountRepository, RepoError, SqliteAccountRepository};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm as Argon2Algorithm, Argon2, Params, Version};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Claims embedded in an identity assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id in decimal form.
    pub sub: String,
    pub username: String,
    /// Issued-at, Unix seconds.
    pub iat: u64,
    /// Expiry, Unix seconds.
    pub exp: u64,
}

/// Signed identity assertion handed back to a freshly authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub account_id: AccountId,
    pub expires_at: u64,
}

/// Verified caller identity threaded into ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account_id: AccountId,
    pub username: String,
}

/// Argon2id credential hasher with configurable cost.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(config: &PasswordHashingConfig) -> Result<Self, ConfigError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|err| ConfigError::Rejected(format!("argon2 parameters: {err}")))?;

        Ok(Self {
            argon2: Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Returns the PHC string for `password` under a fresh random salt.
    pub fn hash(&self, password: &str) -> LedgerResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| LedgerError::Internal(format!("password hashing failed: {err}")))
    }

    /// Checks `password` against a stored PHC string.
    pub fn verify(&self, password: &str, stored_hash: &str) -> LedgerResult<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|err| LedgerError::Internal(format!("stored hash unreadable: {err}")))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(LedgerError::Internal(format!(
                "password verification failed: {err}"
            ))),
        }
    }
}

/// Issues and verifies HS256 identity assertions.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::Rejected(
                "token secret must not be empty".to_string(),
            ));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn issue(&self, account: &Account) -> LedgerResult<AuthToken> {
        let iat = unix_now()?;
        let claims = Claims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            iat,
            exp: iat + self.ttl.as_secs(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| LedgerError::Internal(format!("token signing failed: {err}")))?;

        Ok(AuthToken {
            token,
            account_id: account.id,
            expires_at: claims.exp,
        })
    }

    /// Validates signature and expiry and returns the embedded caller.
    pub fn verify(&self, token: &str) -> LedgerResult<Caller> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| LedgerError::Unauthorized(format!("invalid token: {err}")))?;
        let account_id = data.claims.sub.parse::<AccountId>().map_err(|_| {
            LedgerError::Unauthorized("token subject is not an account id".to_string())
        })?;

        Ok(Caller {
            account_id,
            username: data.claims.username,
        })
    }
}

/// Create-or-verify authenticator.
///
/// Holds no connection; it is built once and shared by every request.
#[derive(Clone)]
pub struct Authenticator {
    hasher: CredentialHasher,
    issuer: TokenIssuer,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            hasher: CredentialHasher::new(&config.password_hashing)?,
            issuer: TokenIssuer::new(&config.token_secret, config.token_ttl())?,
        })
    }

    /// Logs `username` in, registering it with 1000 coins when unknown.
    ///
    /// Usernames are narrower than "any non-empty string": only letters,
    /// digits and `_ . @ -`, up to 64 characters. Names with whitespace or
    /// other punctuation are refused before any lookup, so such accounts can
    /// neither be registered nor logged into.
    ///
    /// # Errors
    /// - `InvalidInput` for blank credentials or a malformed username.
    /// - `Unauthorized` when the password does not match.
    pub fn authenticate(
        &self,
        conn: &Connection,
        username: &str,
        password: &str,
    ) -> LedgerResult<AuthToken> {
        if username.is_empty() || password.is_empty() {
            return Err(LedgerError::invalid_input(
                "username and password are required",
            ));
        }
        if !is_valid_username(username) {
            return Err(LedgerError::invalid_input("malformed username"));
        }

        let accounts = SqliteAccountRepository::new(conn);
        let account = match accounts.get_by_username(username) {
            Ok(existing) => self.check_password(existing, password)?,
            Err(RepoError::NotFound { .. }) => {
                let password_hash = self.hasher.hash(password)?;
                match accounts.create_account(username, &password_hash) {
                    Ok(created) => {
                        info!(
                            "event=account_created module=auth status=ok account={}",
                            created.id
                        );
                        created
                    }
                    Err(RepoError::AlreadyExists { .. }) => {
                        let existing = accounts.get_by_username(username)?;
                        self.check_password(existing, password)?
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        };

        self.issuer.issue(&account)
    }

    /// Resolves an identity assertion into a caller.
    pub fn verify_token(&self, token: &str) -> LedgerResult<Caller> {
        self.issuer.verify(token)
    }

    fn check_password(&self, account: Account, password: &str) -> LedgerResult<Account> {
        if self.hasher.verify(password, &account.password_hash)? {
            return Ok(account);
        }
        warn!(
            "event=auth_rejected module=auth status=rejected account={} error_code=credential_mismatch",
            account.id
        );
        Err(LedgerError::Unauthorized("credential mismatch".to_string()))
    }
}

fn unix_now() -> LedgerResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|err| LedgerError::Internal(format!("system clock before epoch: {err}")))
}
