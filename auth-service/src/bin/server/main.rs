use std::sync::Arc;

use anyhow::Context;
use auth::AuthService;
use auth::AuthServicePort;
use auth_service::config::Config;
use auth_service::config::DirectoryBackend;
use auth_service::domain::user::ports::UserRepository;
use auth_service::domain::user::ports::UserServicePort;
use auth_service::domain::user::service::UserService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::directory::UserDirectoryAdapter;
use auth_service::outbound::repositories::InMemoryUserRepository;
use auth_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,auth=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        directory_backend = ?config.directory.backend,
        access_lifetime_minutes = config.jwt.access_lifetime_minutes,
        refresh_lifetime_hours = config.jwt.refresh_lifetime_hours,
        "Configuration loaded"
    );

    let settings = config.jwt.settings();
    settings.validate().context("Invalid JWT configuration")?;

    let (auth_service, user_service) = match config.directory.backend {
        DirectoryBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            services(Arc::new(PostgresUserRepository::new(pg_pool)), settings)
        }
        DirectoryBackend::Memory => {
            let repository = match &config.directory.seed_file {
                Some(path) => {
                    InMemoryUserRepository::from_seed_file(path, &auth::PasswordHasher::new())
                        .await
                        .with_context(|| format!("Failed to load seed file {}", path))?
                }
                None => InMemoryUserRepository::new(),
            };
            tracing::warn!("Using in-memory user directory; users are lost on restart");

            services(Arc::new(repository), settings)
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, user_service);
    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

fn services<R: UserRepository>(
    repository: Arc<R>,
    settings: auth::JwtSettings,
) -> (Arc<dyn AuthServicePort>, Arc<dyn UserServicePort>) {
    let directory = Arc::new(UserDirectoryAdapter::new(Arc::clone(&repository)));
    let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(directory, settings));
    let user_service: Arc<dyn UserServicePort> = Arc::new(UserService::new(repository));

    (auth_service, user_service)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
