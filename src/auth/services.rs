use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{PublicUser, TokenResponse},
        jwt::JwtKeys,
        password::PasswordHasher,
    },
    error::AppError,
    store::{StoreError, UnitOfWork},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn ensure_valid_email(email: &str) -> Result<(), AppError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "value is not a valid email address".into(),
        ))
    }
}

/// Maps a unique-index conflict to the same error the pre-check produces.
pub(crate) fn duplicate_on_conflict(e: StoreError) -> AppError {
    match e {
        StoreError::UniqueViolation => AppError::DuplicateIdentity,
        other => other.into(),
    }
}

// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_blocking(hasher: &PasswordHasher, password: &str) -> anyhow::Result<String> {
    let hasher = hasher.clone();
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .context("hashing task panicked")?
}

async fn verify_blocking(
    hasher: &PasswordHasher,
    password: &str,
    digest: Option<String>,
) -> anyhow::Result<bool> {
    let hasher = hasher.clone();
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || match digest {
        Some(digest) => hasher.verify(&password, &digest),
        None => {
            hasher.verify_dummy(&password);
            false
        }
    })
    .await
    .context("verification task panicked")
}

pub async fn register(
    hasher: &PasswordHasher,
    uow: &mut dyn UnitOfWork,
    email: &str,
    password: &str,
) -> Result<PublicUser, AppError> {
    if uow.find_user_by_email(email).await?.is_some() {
        warn!("email already registered");
        return Err(AppError::DuplicateIdentity);
    }

    let hash = hash_blocking(hasher, password).await?;
    let user = uow
        .insert_user(email, &hash)
        .await
        .map_err(duplicate_on_conflict)?;

    info!(user_id = user.id, "user registered");
    Ok(user.into())
}

/// Unknown email and wrong password fail identically, including the hashing work done.
pub async fn login(
    hasher: &PasswordHasher,
    keys: &JwtKeys,
    uow: &mut dyn UnitOfWork,
    email: &str,
    password: &str,
) -> Result<TokenResponse, AppError> {
    let user = uow.find_user_by_email(email).await?;
    let digest = user.as_ref().map(|u| u.password_hash.clone());

    let ok = verify_blocking(hasher, password, digest).await?;
    let user = match user {
        Some(user) if ok => user,
        Some(user) => {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            warn!("login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let access_token = keys.sign_access(&user.email)?;
    info!(user_id = user.id, "user logged in");
    Ok(TokenResponse::bearer(access_token))
}
