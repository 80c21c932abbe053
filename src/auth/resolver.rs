use tracing::{debug, warn};

use crate::{
    auth::{jwt::JwtKeys, repo_types::User},
    error::AppError,
    store::UnitOfWork,
};

/// Turns a bearer token into the user it names.
///
/// Performs one lookup on `uow` and never writes. A bad token and a token whose user no
/// longer exists are rejected with different errors.
pub async fn resolve_principal(
    keys: &JwtKeys,
    uow: &mut dyn UnitOfWork,
    token: &str,
) -> Result<User, AppError> {
    let email = keys.verify(token).map_err(|e| {
        warn!("rejected bearer token");
        AppError::from(e)
    })?;

    match uow.find_user_by_email(&email).await? {
        Some(user) => {
            debug!(user_id = user.id, "principal resolved");
            Ok(user)
        }
        None => {
            warn!("token subject has no matching user");
            Err(AppError::PrincipalNotFound)
        }
    }
}
