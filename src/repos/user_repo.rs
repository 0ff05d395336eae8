/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (user_name で引く)
 * - PgPool を受け取り UserStore を実装する
 * - 初期パスワードは argon2 でハッシュ化して保存 (平文は保存しない)
 */
use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString};
use async_trait::async_trait;
use rand_core::OsRng;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::services::roles::{Permission, PermissionSet, UserRecord, UserStore};

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub user_name: String,
    pub permissions: Vec<String>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        // The column is CHECK-constrained to the vocabulary, so this only fails on schema drift.
        let permissions = row
            .permissions
            .iter()
            .map(|p| p.parse::<Permission>())
            .collect::<Result<PermissionSet, _>>()
            .map_err(|e| RepoError::InvalidValue(e.to_string()))?;

        Ok(UserRecord {
            id: row.id,
            user_name: row.user_name,
            permissions,
        })
    }
}

pub fn hash_password(password: &str) -> RepoResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| RepoError::PasswordHash(err.to_string()))
}

// Argon2 is CPU-bound; keep it off the async workers.
pub async fn hash_password_blocking(password: String) -> RepoResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| RepoError::PasswordHash(err.to_string()))?
}

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_user_name(&self, user_name: &str) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, user_name, permissions
            FROM users
            WHERE user_name = $1
            "#,
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert(
        &self,
        user_name: &str,
        password_hash: &str,
        note: &str,
    ) -> RepoResult<UserRow> {
        // ON CONFLICT: a concurrent request may have provisioned the same user first.
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (user_name, password_hash, note)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_name) DO UPDATE SET user_name = EXCLUDED.user_name
            RETURNING id, user_name, permissions
            "#,
        )
        .bind(user_name)
        .bind(password_hash)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    // Last writer wins: a single UPDATE per record, no read-modify-write in SQL.
    pub async fn set_permissions(
        &self,
        user_name: &str,
        permissions: &PermissionSet,
    ) -> RepoResult<u64> {
        let res = sqlx::query(
            r#"
            UPDATE users
            SET permissions = $2, updated_at = now()
            WHERE user_name = $1
            "#,
        )
        .bind(user_name)
        .bind(permissions.to_strings())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find_by_user_name(&self, user_name: &str) -> RepoResult<Option<UserRecord>> {
        self.get_by_user_name(user_name)
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn create(
        &self,
        user_name: &str,
        initial_password: &str,
        note: &str,
    ) -> RepoResult<UserRecord> {
        let password_hash = hash_password_blocking(initial_password.to_owned()).await?;
        self.insert(user_name, &password_hash, note)
            .await?
            .try_into()
    }

    async fn update(&self, record: &UserRecord) -> RepoResult<()> {
        let affected = self
            .set_permissions(&record.user_name, &record.permissions)
            .await?;

        if affected == 0 {
            return Err(RepoError::UserNotFound(record.user_name.clone()));
        }
        Ok(())
    }
}
