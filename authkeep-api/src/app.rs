/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use authkeep_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::with_database(pool, config);
/// let app = authkeep_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use authkeep_shared::{
    auth::{jwt::TokenIssuer, service::AuthService, validator::TokenValidator},
    models::{PgCredentialStore, PgUserDirectory},
    store::{CredentialStore, UserDirectory},
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Session orchestrator
    pub auth: Arc<AuthService>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Database pool, reported on by the health check when present
    pub db: Option<PgPool>,
}

impl AppState {
    /// Wires the orchestrator over arbitrary collaborators
    pub fn new(
        config: Config,
        store: Arc<dyn CredentialStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let tokens = config.token_config();
        let auth = AuthService::new(
            TokenIssuer::new(tokens.clone()),
            TokenValidator::new(&tokens, directory.clone()),
            store,
            directory,
        );

        Self {
            auth: Arc::new(auth),
            config: Arc::new(config),
            db: None,
        }
    }

    /// Wires the orchestrator over the PostgreSQL collaborators
    pub fn with_database(pool: PgPool, config: Config) -> Self {
        let store = Arc::new(PgCredentialStore::new(pool.clone()));
        let directory = Arc::new(PgUserDirectory::new(pool.clone()));

        Self {
            db: Some(pool),
            ..Self::new(config, store, directory)
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// └── /v1/auth/
///     ├── POST /register
///     ├── POST /login
///     ├── POST /refresh
///     ├── POST /logout
///     └── GET  /me          (Bearer access token)
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let session_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout))
        .merge(session_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1/auth", auth_routes)
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}

/// Bearer authentication middleware
///
/// Validates the access token with the access profile and stores the
/// resolved `Identity` in the request extensions.
async fn bearer_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let identity = state.auth.authenticate(token).await?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
