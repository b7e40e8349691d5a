use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{extract::State, middleware::Next, response::Response, routing::get, Router};
use http::{header, HeaderName, HeaderValue, Method};
use tokio::{signal, sync::mpsc};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer};
use tracing::{error, info};

use stockroom_api as api;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db = Arc::new(api::db::establish_connection_from_app_config(&cfg).await?);
    if cfg.auto_migrate {
        if let Err(e) = api::db::run_migrations(db.as_ref()).await {
            error!("Startup migration failed: {e}");
            return Err(e.into());
        }
    }

    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    // One AuthService instance backs both the /auth routes and the extractor
    // middleware; they must share the token revocation list.
    let auth_service = Arc::new(api::auth::AuthService::new(
        api::auth::AuthConfig::from(&cfg),
        db.clone(),
    ));

    let services = api::handlers::AppServices::new(db.clone(), Arc::new(event_sender.clone()));
    let state = api::AppState {
        db: db.clone(),
        config: cfg.clone(),
        event_sender,
        services,
    };

    let cors = build_cors(&cfg).map_err(|msg| {
        error!("{msg}");
        msg
    })?;

    // Layers added later wrap the ones before them, so the request id
    // middleware at the bottom sees the request first and the trace layer can
    // read the id it stores in extensions.
    let app = Router::new()
        .route("/", get(|| async { "stockroom-api up" }))
        .nest("/api/v1", api::api_v1_routes())
        .nest(
            "/auth",
            api::auth::auth_routes().with_state(auth_service.clone()),
        )
        .merge(api::openapi::swagger_ui())
        .layer(api::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            attach_auth_service,
        ))
        .layer(axum::middleware::from_fn(
            api::middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "stockroom-api accepting connections");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Derives the CORS layer from configuration.
///
/// Explicit origins win; otherwise development (or an explicit opt-in) gets
/// the permissive fallback, and anything else is a startup error.
fn build_cors(cfg: &api::config::AppConfig) -> Result<CorsLayer, String> {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        // Wildcards cannot be combined with allow_credentials, so the
        // explicit-origin configuration names its methods and headers too.
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .expose_headers([HeaderName::from_static(
                api::middleware_helpers::request_id::REQUEST_ID_HEADER,
            )])
            .allow_credentials(cfg.cors_allow_credentials));
    }

    if cfg.should_allow_permissive_cors() {
        let reason = if cfg.is_development() {
            "development environment"
        } else {
            "cors_allow_any_origin is set"
        };
        info!("No explicit CORS origins configured; allowing any origin ({reason})");
        return Ok(CorsLayer::permissive());
    }

    Err(
        "CORS is not configured: set APP__CORS_ALLOWED_ORIGINS or opt in with APP__CORS_ALLOW_ANY_ORIGIN=true"
            .to_string(),
    )
}

/// Makes the shared [`api::auth::AuthService`] available to route extractors.
async fn attach_auth_service(
    State(auth): State<Arc<api::auth::AuthService>>,
    mut request: axum::extract::Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(auth);
    next.run(request).await
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("SIGTERM handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Ctrl+C handler unavailable: {e}");
            }
        }
        _ = sigterm => {}
    }

    info!("Shutdown signal received; draining in-flight requests");
}
