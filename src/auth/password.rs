use crate::error::AppError;

pub const BCRYPT_COST: u32 = 10;

/// bcrypt is deliberately slow, so hashing runs off the async workers.
pub async fn hash_password(plain: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("could not hash password: {}", e)))
}

pub async fn verify_password(plain: String, hash: String) -> Result<bool, AppError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?;
    // A malformed stored hash cannot match anything.
    Ok(verified.unwrap_or(false))
}
