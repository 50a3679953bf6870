//! Mini IAM API 서버 진입점.
//!
//! 설정 로드 → 로깅 초기화 → 저장소 열기 → 기본 관리자 생성 → 서버 시작 순으로 진행합니다.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use axum::http::StatusCode;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use iam_api::{create_api_router, metrics_layer, setup_metrics_recorder, swagger_ui_router, AppState};
use iam_core::logging::init_logging;
use iam_core::{
    AppConfig, CredentialStore, JsonFileCredentialStore, MemoryCredentialStore, StorageBackend,
};

/// 선택적 설정 파일 경로.
const CONFIG_FILE: &str = "config/default.toml";

/// CORS 레이어 생성.
///
/// - `CORS_ORIGINS`: 쉼표로 구분된 허용 origin 목록. 없으면 모든 origin 허용
fn cors_layer() -> CorsLayer {
    let configured = std::env::var("CORS_ORIGINS").ok().filter(|o| !o.is_empty());

    let allow_origin = match &configured {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        None => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .merge(swagger_ui_router())
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer())
}

/// 설정된 백엔드로 자격증명 저장소를 엽니다.
///
/// 파일을 읽거나 파싱할 수 없으면 시작을 중단합니다.
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CredentialStore>> {
    match config.storage.backend {
        StorageBackend::File => {
            let path = &config.storage.users_db;
            let store = JsonFileCredentialStore::open(path)
                .await
                .with_context(|| format!("failed to open credential store at {}", path.display()))?;
            info!(path = %store.path().display(), "Using JSON file credential store");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory credential store; users are lost on restart");
            Ok(Arc::new(MemoryCredentialStore::new()))
        }
    }
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그가 있으면 OpenAPI JSON을 stdout으로 출력합니다.
/// 출력했으면 `true`.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use iam_api::ApiDoc;
    use utoipa::OpenApi as _;

    if !std::env::args().any(|arg| arg == "--export-openapi") {
        return Ok(false);
    }

    let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
    println!("{}", json);
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load(Some(Path::new(CONFIG_FILE)))
        .context("failed to load configuration")?;

    init_logging(&config.logging).map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    info!("Starting Mini IAM API server...");
    info!(
        ttl_secs = config.auth.token_ttl.num_seconds(),
        backend = ?config.storage.backend,
        "Configuration loaded"
    );

    let metrics_handle =
        setup_metrics_recorder().context("failed to install Prometheus recorder")?;

    let store = open_store(&config).await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let state = Arc::new(AppState::new(Arc::new(config), store));

    if state
        .identity
        .ensure_default_admin()
        .await
        .context("failed to create default admin user")?
    {
        info!("Default admin account created");
    }

    let app = create_router(state, metrics_handle);

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM을 수신하면 반환합니다. 핸들러 설치에 실패한 시그널은
/// 무시하고 나머지 시그널만 기다립니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
