//! User repository backed by PostgreSQL

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use super::UserRepository;
use crate::models::{NewUser, User, UserChanges};

/// User repository for database operations
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> DatabaseResult<Option<User>> {
        let sql = format!(
            r#"
            SELECT id, login, password, email, active, create_date, modify_date
            FROM tb_user
            WHERE {} = $1
            "#,
            column
        );

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(user_from_row))
    }
}

fn user_from_row(row: PgRow) -> User {
    User {
        id: row.get("id"),
        login: row.get("login"),
        password: row.get("password"),
        email: row.get("email"),
        active: row.get("active"),
        create_date: row.get("create_date"),
        modify_date: row.get("modify_date"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, login, password, email, active, create_date, modify_date
            FROM tb_user
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn find_by_login(&self, login: &str) -> DatabaseResult<Option<User>> {
        self.find_one("login", login).await
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn insert(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.login);

        let row = sqlx::query(
            r#"
            INSERT INTO tb_user (login, password, email, active)
            VALUES ($1, $2, $3, FALSE)
            RETURNING id, login, password, email, active, create_date, modify_date
            "#,
        )
        .bind(&new_user.login)
        .bind(&new_user.password_hash)
        .bind(&new_user.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(row))
    }

    async fn activate(&self, id: i64) -> DatabaseResult<Option<User>> {
        info!("Activating user {}", id);

        let row = sqlx::query(
            r#"
            UPDATE tb_user
            SET active = TRUE, modify_date = NOW()
            WHERE id = $1
            RETURNING id, login, password, email, active, create_date, modify_date
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> DatabaseResult<Option<User>> {
        info!("Updating user {}", id);

        let row = sqlx::query(
            r#"
            UPDATE tb_user
            SET password = $2,
                email = COALESCE($3, email),
                active = COALESCE($4, active),
                modify_date = NOW()
            WHERE id = $1
            RETURNING id, login, password, email, active, create_date, modify_date
            "#,
        )
        .bind(id)
        .bind(&changes.password_hash)
        .bind(&changes.email)
        .bind(changes.active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn delete(&self, id: i64) -> DatabaseResult<Option<User>> {
        info!("Deleting user {}", id);

        let row = sqlx::query(
            r#"
            DELETE FROM tb_user
            WHERE id = $1
            RETURNING id, login, password, email, active, create_date, modify_date
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }
}
