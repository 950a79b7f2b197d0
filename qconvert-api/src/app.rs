/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use qconvert_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = qconvert_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        auth::{jwt_auth_layer, optional_auth_layer},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use qconvert_shared::{
    auth::jwt::{self, JwtError},
    catalog::Catalogs,
    convert::{CodeConverter, HttpCodeConverter, UnconfiguredConverter},
    files::UploadStore,
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor; everything heavy
/// sits behind an `Arc` or is itself a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Immutable plan, template and provider catalogs
    pub catalogs: Arc<Catalogs>,

    /// External code converter
    pub converter: Arc<dyn CodeConverter>,

    /// Uploaded file storage
    pub uploads: UploadStore,
}

impl AppState {
    /// Creates application state, choosing the converter backend from config
    ///
    /// # Errors
    ///
    /// Returns an error if the converter HTTP client cannot be built.
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let converter: Arc<dyn CodeConverter> = match &config.converter.url {
            Some(url) => {
                let timeout = Duration::from_secs(config.converter.timeout_seconds);
                tracing::info!(endpoint = %url, "Using HTTP code converter");
                Arc::new(HttpCodeConverter::new(url.clone(), timeout)?)
            }
            None => {
                tracing::warn!("CONVERTER_URL is not set; conversions will report failure");
                Arc::new(UnconfiguredConverter)
            }
        };

        Ok(Self::with_converter(db, config, converter))
    }

    /// Creates application state with an explicit converter backend
    pub fn with_converter(db: PgPool, config: Config, converter: Arc<dyn CodeConverter>) -> Self {
        let uploads = UploadStore::new(&config.storage.upload_dir);

        Self {
            db,
            config: Arc::new(config),
            catalogs: Arc::new(Catalogs::builtin()),
            converter,
            uploads,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Issues a session token for a user
    pub fn issue_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        jwt::issue_token(user_id, self.jwt_secret(), self.config.jwt.expires_in_hours)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/
///     ├── /auth/                       # register, login, OAuth (public); me, profile, password
///     ├── /billing/                    # overview, plans, history, subscription, address, payment methods
///     ├── /convert                     # code conversion, records every outcome
///     ├── /qcode-convert/              # code conversion, records successes; library list
///     ├── /history/                    # conversion history
///     ├── /workflows/                  # workflows and templates
///     ├── /qdata-clean/                # data files and derived views
///     ├── /files/upload                # raw upload (public)
///     ├── /qbenchmark-live/            # provider catalog (public)
///     ├── /users/stats                 # caller's counters
///     └── /quantum-libraries/          # library catalog
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Authentication (per route group)
/// 2. Body limits
/// 3. Logging (tower-http TraceLayer)
/// 4. CORS (tower-http CorsLayer)
/// 5. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth = || from_fn_with_state(state.clone(), jwt_auth_layer);
    let optional_auth = || from_fn_with_state(state.clone(), optional_auth_layer);

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/google", get(routes::auth::google_oauth))
        .route("/github", get(routes::auth::github_oauth))
        .merge(
            Router::new()
                .route("/me", get(routes::auth::me))
                .route("/profile", put(routes::auth::update_profile))
                .route("/password", put(routes::auth::change_password))
                .route_layer(auth()),
        );

    let billing_routes = Router::new()
        .route("/overview", get(routes::billing::overview))
        .route("/plans", get(routes::billing::plans))
        .route("/history", get(routes::billing::history))
        .route("/subscription/change", post(routes::billing::change_subscription))
        .route("/subscription/upgrade", post(routes::billing::upgrade_subscription))
        .route("/subscription/cancel", post(routes::billing::cancel_subscription))
        .route(
            "/address",
            get(routes::billing::get_address).put(routes::billing::update_address),
        )
        .route(
            "/payment-methods",
            get(routes::payment_methods::list_payment_methods)
                .post(routes::payment_methods::create_payment_method),
        )
        .route(
            "/payment-methods/:id/default",
            put(routes::payment_methods::set_default_payment_method),
        )
        .route(
            "/payment-methods/:id",
            delete(routes::payment_methods::delete_payment_method),
        )
        .route_layer(auth());

    let qcode_routes = Router::new()
        .route("/libraries", get(routes::convert::list_libraries))
        .merge(
            Router::new()
                .route("/convert", post(routes::convert::qcode_convert))
                .route_layer(auth()),
        );

    let history_routes = Router::new()
        .route(
            "/",
            get(routes::history::list_history).delete(routes::history::clear_history),
        )
        .route(
            "/:id",
            get(routes::history::get_history_entry)
                .patch(routes::history::update_history_tags)
                .delete(routes::history::delete_history_entry),
        )
        .route_layer(auth());

    // Listing is the one workflow route whose gate depends on the environment
    let list_workflows = if state.config.api.production {
        get(routes::workflows::list_workflows).layer(auth())
    } else {
        get(routes::workflows::list_workflows).layer(optional_auth())
    };

    let workflow_routes = Router::new()
        .route("/templates", get(routes::workflows::list_templates))
        .route("/", list_workflows)
        .merge(
            Router::new()
                .route(
                    "/",
                    post(routes::workflows::create_workflow)
                        .delete(routes::workflows::delete_workflow_by_query),
                )
                .route(
                    "/templates/:template_id/use",
                    post(routes::workflows::use_template),
                )
                .route(
                    "/:id",
                    get(routes::workflows::get_workflow)
                        .put(routes::workflows::update_workflow)
                        .delete(routes::workflows::delete_workflow),
                )
                .route("/:id/run", post(routes::workflows::run_workflow))
                .route_layer(auth()),
        );

    let data_clean_routes = Router::new()
        .route(
            "/upload",
            post(routes::data_clean::upload_file).route_layer(optional_auth()),
        )
        .merge(
            Router::new()
                .route("/files", get(routes::data_clean::list_files))
                .route(
                    "/files/:id",
                    get(routes::data_clean::get_file).delete(routes::data_clean::delete_file),
                )
                .route("/files/:id/raw", get(routes::data_clean::raw_file))
                .route("/files/:id/data", get(routes::data_clean::file_data))
                .route("/files/:id/export", get(routes::data_clean::export_file))
                .route("/files/:id/export-chart", get(routes::data_clean::export_chart))
                .route("/files/:id/process", post(routes::data_clean::process_file))
                .route_layer(auth()),
        );

    let benchmark_routes = Router::new()
        .route("/providers", get(routes::benchmark::list_providers))
        .route("/status", get(routes::benchmark::provider_status));

    let library_routes = Router::new()
        .route("/", get(routes::libraries::list_libraries))
        .merge(
            Router::new()
                .route("/seed", post(routes::libraries::seed_libraries))
                .route_layer(auth()),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/billing", billing_routes)
        .route("/convert", post(routes::convert::convert).route_layer(auth()))
        .nest("/qcode-convert", qcode_routes)
        .nest("/history", history_routes)
        .nest("/workflows", workflow_routes)
        .nest("/qdata-clean", data_clean_routes)
        .route("/files/upload", post(routes::files::upload))
        .nest("/qbenchmark-live", benchmark_routes)
        .route("/users/stats", get(routes::users::stats).route_layer(auth()))
        .nest("/quantum-libraries", library_routes);

    let cors = cors_layer(&state.config);
    let max_upload_bytes = state.config.storage.max_upload_bytes;

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS configuration: permissive for `*`, explicit origins otherwise
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, ConverterConfig, DatabaseConfig, JwtConfig, StorageConfig};

    fn config(origins: &[&str]) -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                cors_origins: origins.iter().map(|o| o.to_string()).collect(),
                frontend_url: "http://localhost:3000".to_string(),
                production: false,
                json_logs: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/qconvert".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expires_in_hours: 1,
            },
            storage: StorageConfig {
                upload_dir: "uploads".to_string(),
                max_upload_bytes: 1024,
            },
            converter: ConverterConfig {
                url: None,
                timeout_seconds: 5,
            },
        }
    }

    #[test]
    fn test_cors_layer_builds_for_both_modes() {
        let _ = cors_layer(&config(&["*"]));
        let _ = cors_layer(&config(&["https://app.example.com"]));
    }

    #[tokio::test]
    async fn test_issue_token_round_trips() {
        let pool = qconvert_shared::db::pool::create_lazy_pool(
            qconvert_shared::db::pool::DatabaseConfig {
                url: "postgresql://localhost/qconvert".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let state = AppState::new(pool, config(&["*"])).unwrap();

        let user_id = Uuid::new_v4();
        let token = state.issue_token(user_id).unwrap();
        let claims = jwt::validate_token(&token, state.jwt_secret()).unwrap();
        assert_eq!(claims.sub, user_id);
    }
}
