use crate::auth::repo_types::User;
use sqlx::PgPool;
use uuid::Uuid;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, pin_hash, can_generate_images, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, pin_hash, can_generate_images, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with a hashed PIN.
    pub async fn create(db: &PgPool, email: &str, pin_hash: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, pin_hash)
            VALUES ($1, $2)
            RETURNING id, email, pin_hash, can_generate_images, created_at
            "#,
        )
        .bind(email)
        .bind(pin_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_pin_hash(db: &PgPool, id: Uuid, pin_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET pin_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(pin_hash)
            .execute(db)
            .await?;
        Ok(())
    }
}
