//! # User Repository
//!
//! Store users with `admin` / `employee` roles.
//!
//! Passwords are stored as argon2 PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`). The hash never leaves this
//! module: every public method returns [`User`], which has no password field.
//!
//! Admin-only operations take the acting user's username and check its role
//! before doing anything else.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::{from_millis, to_millis};
use crate::error::{DbError, DbResult};
use stockroom_core::validation::{validate_password, validate_store, validate_username};
use stockroom_core::{new_id, CoreError, Role, User};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    role: Role,
    store: String,
    created_at_ms: i64,
}

impl UserRow {
    fn into_user(self) -> DbResult<User> {
        Ok(User {
            id: self.id,
            username: self.username,
            role: self.role,
            store: self.store,
            created_at: from_millis(self.created_at_ms)?,
        })
    }
}

/// Fields accepted at registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
    pub store: String,
}

/// Repository for the user directory.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a user. The role defaults to `employee`.
    ///
    /// ## Errors
    /// * `Domain(Validation)` - username 3..=50 chars, password >= 6 chars, store required
    /// * `UniqueViolation` - username taken
    pub async fn register(&self, new: NewUser) -> DbResult<User> {
        let username = validate_username(&new.username).map_err(CoreError::from)?;
        validate_password(&new.password).map_err(CoreError::from)?;
        let store = validate_store(&new.store).map_err(CoreError::from)?;

        let user = User {
            id: new_id(),
            username,
            role: new.role.unwrap_or_default(),
            store,
            created_at: from_millis(to_millis(Utc::now()))?,
        };
        let password_hash = hash_password(&new.password)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, store, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&password_hash)
        .bind(user.role)
        .bind(&user.store)
        .bind(to_millis(user.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation() => DbError::duplicate("username", &user.username),
            err => err,
        })?;

        info!(username = %user.username, role = ?user.role, store = %user.store, "User registered");
        Ok(user)
    }

    /// Checks credentials. Unknown usernames and wrong passwords fail the
    /// same way.
    pub async fn login(&self, username: &str, password: &str) -> DbResult<User> {
        let row = self.find_row(username.trim()).await?;

        match row {
            Some(row) if verify_password(password, &row.password_hash) => {
                debug!(username = %row.username, "Login succeeded");
                row.into_user()
            }
            _ => {
                warn!(username = %username.trim(), "Login failed");
                Err(CoreError::InvalidCredentials.into())
            }
        }
    }

    /// All users. Admin only.
    pub async fn list(&self, requester: &str) -> DbResult<Vec<User>> {
        self.require_admin(requester).await?;

        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, store, created_at_ms FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    /// Users of one store.
    pub async fn by_store(&self, store: &str) -> DbResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, store, created_at_ms
            FROM users
            WHERE store = ?1
            ORDER BY username
            "#,
        )
        .bind(store.trim())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    /// Distinct store names known from users and products, sorted.
    pub async fn stores(&self) -> DbResult<Vec<String>> {
        let stores: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT store FROM users
            UNION
            SELECT store FROM products
            ORDER BY store
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stores)
    }

    /// Changes a user's role. Admin only.
    pub async fn update_role(&self, requester: &str, user_id: &str, role: Role) -> DbResult<User> {
        self.require_admin(requester).await?;

        let result = sqlx::query("UPDATE users SET role = ?2 WHERE id = ?1")
            .bind(user_id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }

        info!(user_id = %user_id, role = ?role, by = %requester, "User role updated");
        self.get(user_id).await
    }

    /// Replaces a password after checking the current one.
    pub async fn change_password(&self, user_id: &str, current: &str, new_password: &str) -> DbResult<()> {
        validate_password(new_password).map_err(CoreError::from)?;

        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, store, created_at_ms FROM users WHERE id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

        if !verify_password(current, &row.password_hash) {
            return Err(CoreError::InvalidCredentials.into());
        }

        sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
            .bind(user_id)
            .bind(hash_password(new_password)?)
            .execute(&self.pool)
            .await?;

        info!(username = %row.username, "Password changed");
        Ok(())
    }

    /// Deletes a user. Admin only; an admin cannot delete its own account.
    pub async fn delete(&self, requester: &str, user_id: &str) -> DbResult<()> {
        let admin = self.require_admin(requester).await?;
        if admin.id == user_id {
            return Err(CoreError::invalid("You cannot delete your own account").into());
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }

        info!(user_id = %user_id, by = %requester, "User deleted");
        Ok(())
    }

    /// Gets a user by ID, failing with `UserNotFound`.
    pub async fn get(&self, user_id: &str) -> DbResult<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, store, created_at_ms FROM users WHERE id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::from(CoreError::UserNotFound(user_id.to_string())))?
        .into_user()
    }

    async fn find_row(&self, username: &str) -> DbResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, store, created_at_ms FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Resolves the acting user and checks it is an admin.
    async fn require_admin(&self, requester: &str) -> DbResult<User> {
        let requester_user = self.find_row(requester.trim()).await?.map(UserRow::into_user).transpose()?;

        match requester_user {
            Some(user) if user.is_admin() => Ok(user),
            _ => {
                warn!(requester = %requester, "Admin check failed");
                Err(CoreError::Forbidden("Admin privileges required.".to_string()).into())
            }
        }
    }
}

/// Hashes a password into an argon2 PHC string.
fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Tests
// =============================================================================
