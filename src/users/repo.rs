use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::repo_types::{ProfileChanges, User, UserRow};
use crate::auth::SessionUser;

const USER_COLUMNS: &str = "id, email, name, image, age, weight, height, gender, created_at";

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Idempotently resolves the identity to a user row, creating it on first sight.
    async fn ensure_user(&self, identity: &SessionUser) -> anyhow::Result<User>;

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Applies the provided profile fields, creating the user row if needed.
    async fn upsert_profile(
        &self,
        identity: &SessionUser,
        changes: &ProfileChanges,
    ) -> anyhow::Result<User>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Upsert keyed by email, usable inside a caller's transaction.
pub(crate) async fn ensure_user_on(
    conn: &mut PgConnection,
    identity: &SessionUser,
) -> anyhow::Result<User> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (email, name, image)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&identity.email)
    .bind(&identity.name)
    .bind(&identity.image)
    .fetch_one(conn)
    .await
    .context("upsert user")?;
    User::try_from(row)
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn ensure_user(&self, identity: &SessionUser) -> anyhow::Result<User> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        ensure_user_on(&mut conn, identity).await
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        row.map(User::try_from).transpose()
    }

    async fn upsert_profile(
        &self,
        identity: &SessionUser,
        changes: &ProfileChanges,
    ) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, name, image, age, weight, height, gender)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE SET
                age    = COALESCE(EXCLUDED.age, users.age),
                weight = COALESCE(EXCLUDED.weight, users.weight),
                height = COALESCE(EXCLUDED.height, users.height),
                gender = COALESCE(EXCLUDED.gender, users.gender)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(&identity.image)
        .bind(changes.age)
        .bind(changes.weight)
        .bind(changes.height)
        .bind(changes.gender.map(|g| g.as_str()))
        .fetch_one(&self.db)
        .await
        .context("upsert user profile")?;
        User::try_from(row)
    }
}
