//! Seeding commands.

use sqlx::PgPool;

use loomcart_core::Email;

use super::{CommandError, database_url};

/// Create an admin principal, or promote the existing record for this email.
///
/// Registration through the API always starts principals as buyers, so the
/// first admin has to come from here.
///
/// # Errors
///
/// Returns `CommandError` if the email is unusable, the database URL is
/// missing, or the upsert fails.
pub async fn admin(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)
        .map_err(|e| CommandError::InvalidInput(e.to_string()))?
        .normalized();

    let url = database_url()?;
    let pool = PgPool::connect(&url).await?;

    sqlx::query(
        r"
        INSERT INTO users (email, role)
        VALUES ($1, 'admin')
        ON CONFLICT (email) DO UPDATE SET role = 'admin'
        ",
    )
    .bind(&email)
    .execute(&pool)
    .await?;

    tracing::info!(email = %email, "admin principal ready");
    Ok(())
}
