use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod accounts;
mod config;
mod database;
mod email;
mod error;
mod filters;
mod jwt;
mod middleware;
mod models;
mod password;
mod repositories;
mod revocation;
mod routes;
mod state;
mod templates;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};
use tokio::net::TcpListener;

use crate::{
    accounts::AccountService,
    config::{AppConfig, RevocationBackend},
    email::{MailgunConfig, MailgunMailer},
    jwt::{JwtConfig, JwtService},
    repositories::{PgMovieRepository, PgUserRepository},
    revocation::{InMemoryRevocationRegistry, RedisRevocationRegistry, RevocationRegistry},
    state::AppState,
    templates::Templates,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting catalog service");

    let app_config = AppConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::ensure_schema(&pool).await?;

    let jwt = JwtService::new(JwtConfig::from_env()?);

    let revocations: Arc<dyn RevocationRegistry> = match app_config.revocation_backend {
        RevocationBackend::Memory => {
            warn!("Revoked tokens are kept in memory and will be accepted again after a restart");
            Arc::new(InMemoryRevocationRegistry::new())
        }
        RevocationBackend::Redis => {
            let redis_pool = RedisPool::new(&RedisConfig::from_env())?;
            if !redis_pool.health_check().await? {
                anyhow::bail!("Failed to connect to Redis");
            }
            Arc::new(RedisRevocationRegistry::new(redis_pool))
        }
    };
    if !app_config.blacklist_enabled {
        warn!("Token revocation checks are disabled");
    }

    let templates = Templates::new()?;
    let mailer = MailgunMailer::new(
        MailgunConfig::from_env()?,
        templates.clone(),
        &app_config.public_url,
    )?;

    let movie_filters = filters::load_allowed_filters(&app_config.filters_config)?;
    info!(
        "Movie list filters: {}",
        movie_filters
            .iter()
            .map(|key| key.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let accounts = AccountService::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(mailer),
        jwt.clone(),
        revocations.clone(),
    );

    let app_state = AppState {
        movie_repository: Arc::new(PgMovieRepository::new(pool)),
        accounts,
        jwt,
        revocations,
        blacklist_enabled: app_config.blacklist_enabled,
        movie_filters: Arc::new(movie_filters),
        templates,
    };

    info!("Catalog service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&app_config.server_address).await?;
    info!("Catalog service listening on {}", app_config.server_address);

    axum::serve(listener, app).await?;

    Ok(())
}
