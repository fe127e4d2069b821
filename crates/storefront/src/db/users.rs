//! User repository for database operations.
//!
//! Users own their cart: it is stored as a JSONB column on the user row
//! and only ever written whole (last-write-wins for a single owner).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marigold_core::{Email, UserId};

use super::RepositoryError;
use crate::models::cart::Cart;
use crate::models::user::User;

/// Database row for a user.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: Option<String>,
    cart: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let cart: Cart = serde_json::from_value(self.cart).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cart in database: {e}"))
        })?;

        Ok(User {
            id: UserId::new(self.id),
            email,
            name: self.name,
            cart,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email or
    /// cart cannot be decoded.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, cart, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, cart, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Create a new user with email, optional display name, and password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Create user (cart starts empty via the column default)
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, name)
            VALUES ($1, $2)
            RETURNING id, email, name, cart, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let user = row.into_user()?;

        // Create password entry
        sqlx::query(
            r"
            INSERT INTO user_passwords (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(user.id.as_i32())
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Get a user's password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct UserPasswordRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: Option<String>,
        }

        let row = sqlx::query_as::<_, UserPasswordRow>(
            r"
            SELECT u.id, u.email, u.name, u.cart, u.created_at, u.updated_at,
                   p.password_hash
            FROM users u
            LEFT JOIN user_passwords p ON u.id = p.user_id
            WHERE u.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let Some(password_hash) = r.password_hash else {
            return Ok(None);
        };

        Ok(Some((r.user.into_user()?, password_hash)))
    }

    /// Fetch just the cart column for a user.
    ///
    /// Reads the freshest cart state rather than whatever user snapshot a
    /// request happens to be holding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn get_cart(&self, id: UserId) -> Result<Cart, RepositoryError> {
        let value: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT cart FROM users WHERE id = $1")
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        let (cart,) = value.ok_or(RepositoryError::NotFound)?;

        serde_json::from_value(cart)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid cart in database: {e}")))
    }

    /// Replace a user's cart.
    ///
    /// The cart is written whole; concurrent writers for the same user
    /// resolve last-write-wins at the row level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn save_cart(&self, id: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let value = serde_json::to_value(cart).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize cart: {e}"))
        })?;

        let result = sqlx::query(
            r"
            UPDATE users
            SET cart = $1, updated_at = now()
            WHERE id = $2
            ",
        )
        .bind(value)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
