use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use tokio::signal;

use crate::{
    auth::Role,
    config::Settings,
    database,
    models::UserCreate,
    repositories::Repositories,
    routes::create_router,
    services::AuthService,
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "enterprize")]
#[command(version)]
#[command(about = "Dashboard for Burp Suite scan nodes, assets and scans", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run the web server (default)
    Serve,
    /// Create the schema and optionally a first administrator
    Init(InitArgs),
    /// Apply pending database migrations
    Migrate,
    /// Add a user account
    CreateUser(CreateUserArgs),
}

#[derive(Args, Debug, PartialEq)]
pub struct InitArgs {
    #[arg(long, requires_all = ["name", "password"], help = "Administrator email")]
    pub email: Option<String>,
    #[arg(long, requires = "email", help = "Administrator display name")]
    pub name: Option<String>,
    #[arg(long, requires = "email", help = "Administrator password")]
    pub password: Option<String>,
}

#[derive(Args, Debug, PartialEq)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub password: String,
    #[arg(long, help = "Grant the admin role")]
    pub admin: bool,
}

pub async fn run(command: Command, config: Settings) -> Result<()> {
    match command {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            let pool = database::connect(&config.database_url).await?;
            database::run_migrations(&pool).await?;
            tracing::info!("Migration complete");
            Ok(())
        }
        Command::Init(args) => {
            let pool = database::create_connection_pool(&config.database_url).await?;
            tracing::info!("Database initialized");

            if let (Some(email), Some(name), Some(password)) = (args.email, args.name, args.password)
            {
                let auth = AuthService::new(config.into(), Repositories::sqlx(pool).users);
                create_user(&auth, email, name, password, Role::Admin).await?;
            }
            Ok(())
        }
        Command::CreateUser(args) => {
            let pool = database::create_connection_pool(&config.database_url).await?;
            let auth = AuthService::new(config.into(), Repositories::sqlx(pool).users);
            let role = if args.admin { Role::Admin } else { Role::User };
            create_user(&auth, args.email, args.name, args.password, role).await
        }
    }
}

async fn create_user(
    auth: &AuthService,
    email: String,
    name: String,
    password: String,
    role: Role,
) -> Result<()> {
    let user = auth
        .create_user(UserCreate {
            email,
            name,
            password,
            role: Some(role),
        })
        .await
        .context("failed to create user")?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %role, "User created");
    Ok(())
}

async fn serve(config: Settings) -> Result<()> {
    let addr: SocketAddr = match config.bind_address.parse() {
        Ok(addr) => addr,
        Err(_) => bail!("BIND_ADDRESS '{}' is not a socket address", config.bind_address),
    };

    let app_state = AppState::new(config).await?;
    let app = create_router(app_state);

    tracing::info!("Server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
