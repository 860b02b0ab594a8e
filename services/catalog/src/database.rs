//! Table bootstrap for the catalog service

use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;

const CREATE_MOVIE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tb_movie (
    id VARCHAR(7) PRIMARY KEY,
    "type" VARCHAR(10) NOT NULL,
    title VARCHAR(100) NOT NULL,
    director VARCHAR(200),
    "cast" VARCHAR(2000),
    country VARCHAR(100),
    date_added TIMESTAMPTZ DEFAULT NOW(),
    release_year INTEGER NOT NULL,
    rating VARCHAR(10),
    duration VARCHAR(15),
    listed_in VARCHAR(200) NOT NULL,
    description VARCHAR(9999) NOT NULL
)
"#;

const CREATE_USER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tb_user (
    id BIGSERIAL PRIMARY KEY,
    login VARCHAR(50) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    email VARCHAR(50) NOT NULL UNIQUE,
    active BOOLEAN NOT NULL DEFAULT FALSE,
    create_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    modify_date TIMESTAMPTZ NULL
)
"#;

/// Create the catalog tables when they do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> DatabaseResult<()> {
    for statement in [CREATE_MOVIE_TABLE, CREATE_USER_TABLE] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(DatabaseError::Schema)?;
    }

    info!("Catalog tables are in place");
    Ok(())
}
