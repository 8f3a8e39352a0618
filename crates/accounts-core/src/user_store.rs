//! Identity persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::password::PasswordHash;
use crate::types::{NewUser, Role, User};
use crate::{Error, Result};

/// Profile fields to overwrite. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// User storage trait
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new identity. Fails with [`Error::UserAlreadyExists`] if the
    /// email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user(&self, id: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<User>;
    async fn set_password_hash(&self, id: &str, hash: &PasswordHash) -> Result<()>;
    /// Overwrite (or clear) the single stored refresh-token hash. Returns
    /// `false` when no such identity exists.
    async fn set_refresh_token_hash(&self, id: &str, hash: Option<&PasswordHash>) -> Result<bool>;
    /// Remove every identity. Used by the seeder only.
    async fn delete_all(&self) -> Result<u64>;
}

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'customer',
        phone_number TEXT,
        active BOOLEAN NOT NULL DEFAULT 1,
        refresh_token_hash TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, role, phone_number, \
                            active, refresh_token_hash, created_at, updated_at";

/// SQLite-backed user store
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    role: String,
    phone_number: Option<String>,
    active: bool,
    refresh_token_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        let role: Role = row
            .role
            .parse()
            .map_err(|_| Error::internal(format!("stored role '{}' is not recognised", row.role)))?;

        Ok(User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: PasswordHash::from_stored(row.password_hash),
            role,
            phone_number: row.phone_number,
            active: row.active,
            refresh_token_hash: row.refresh_token_hash.map(PasswordHash::from_stored),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl SqliteUserStore {
    /// Connect and create the schema if needed
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::from_pool(pool).await
    }

    /// Reuse an existing pool
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_USERS_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, password_hash, role,
                               phone_number, active, refresh_token_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, NULL, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(user.role.as_str())
        .bind(&user.phone_number)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(Error::UserAlreadyExists(user.email));
            }
            Err(e) => return Err(e.into()),
        }

        debug!("Inserted user {}", user.id);

        Ok(User {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            phone_number: user.phone_number,
            active: true,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.fetch_one_by("id", id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one_by("email", email).await
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<User> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                phone_number = COALESCE(?, phone_number),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone_number)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound(id.to_string()));
        }

        self.get_user(id)
            .await?
            .ok_or_else(|| Error::UserNotFound(id.to_string()))
    }

    async fn set_password_hash(&self, id: &str, hash: &PasswordHash) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(hash.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_refresh_token_hash(&self, id: &str, hash: Option<&PasswordHash>) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET refresh_token_hash = ?, updated_at = ? WHERE id = ?")
                .bind(hash.map(PasswordHash::as_str))
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
