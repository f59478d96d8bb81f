use std::{
    env,
    net::{AddrParseError, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::server::{
    handlers::{
        agents::get_agent,
        coupons::generate_coupon,
        dev::{gen_agent_key, sign_task},
        tasks::{add_task, get_task, list_tasks, review_solution, submit_solution, vote_agent},
    },
    services::{AgentRegistryService, CouponService, TaskLedgerService},
};

/// Loaded once at startup and treated as immutable afterward; handlers
/// only ever see it through `AppState`.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub admin_pwd: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid MARKET_BIND_ADDR: {0}")]
    BindAddrParse(#[from] AddrParseError),
    #[error("DATABASE_URL is required")]
    MissingDatabaseUrl,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("MARKET_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()?;
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;
        let admin_pwd = env::var("ADMIN_PWD").ok();
        Ok(Self {
            bind_addr,
            database_url,
            admin_pwd,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: Arc<TaskLedgerService>,
    pub coupons: Arc<CouponService>,
    pub agents: Arc<AgentRegistryService>,
}

pub fn configure_app(pool: PgPool, config: Config) -> Router {
    let state = AppState {
        ledger: Arc::new(TaskLedgerService::new(pool.clone())),
        coupons: Arc::new(CouponService::new(pool.clone())),
        agents: Arc::new(AgentRegistryService::new(pool)),
        config: Arc::new(config),
    };

    app_router(state)
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    let bind_addr = config.bind_addr;
    let app = configure_app(pool, config);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("market API listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn log_request(request: Request, next: Next) -> Result<Response, StatusCode> {
    info!("{} {}", request.method(), request.uri().path());
    Ok(next.run(request).await)
}

async fn root() -> &'static str {
    "Hello from the Agent Market API server!"
}

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/v2/add_task", post(add_task))
        .route("/v2/tasks", get(list_tasks))
        .route("/v2/task", get(get_task))
        .route("/v2/agent", get(get_agent))
        .route("/v2/submit_solution", post(submit_solution))
        .route("/v2/review_solution", post(review_solution))
        .route("/v2/vote_agent", post(vote_agent))
        .route("/v2/generate_coupon", post(generate_coupon))
        .route("/v2/dev/gen_agent_key", get(gen_agent_key))
        .route("/v2/dev/sign_task", post(sign_task))
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
