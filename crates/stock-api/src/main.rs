//! Stock Viewer API 서버.
//!
//! Axum 기반 읽기 전용 REST API 서버를 시작합니다.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    http::{header, Method, StatusCode},
    Router,
};
use clap::{Parser, ValueEnum};
use stock_api::{
    openapi::{swagger_ui_router, ApiDoc},
    routes::create_api_router,
    AppState, ServerConfig,
};
use stock_data::{mask_database_url, Database, DatabaseConfig, PgPriceStore};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi as _;

#[derive(Parser)]
#[command(name = "stock-api")]
#[command(about = "Stock Viewer read-only REST API", long_about = None)]
#[command(version)]
struct Cli {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// OpenAPI JSON을 stdout으로 출력하고 종료
    #[arg(long)]
    export_openapi: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "stock_api={},stock_data={},tower_http={}",
            level, level, level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// CORS 미들웨어 구성.
///
/// origin 목록이 비어 있으면 모든 origin을 허용합니다.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();

    let allow_origin = if parsed.is_empty() {
        if !origins.is_empty() {
            warn!("CORS_ORIGINS에 유효한 origin이 없어 모든 origin을 허용합니다");
        }
        AllowOrigin::any()
    } else {
        info!(count = parsed.len(), "CORS 허용 origin 설정");
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .merge(create_api_router().with_state(state))
        // OpenAPI 문서 및 Swagger UI
        .merge(swagger_ui_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(cors_layer(&config.cors_origins))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.export_openapi {
        println!("{}", serde_json::to_string_pretty(&ApiDoc::openapi())?);
        return Ok(());
    }

    init_tracing(&cli.log_level, cli.log_format);
    info!("Stock Viewer API 서버 시작");

    let config = ServerConfig::from_env()?;
    let addr = config.socket_addr().with_context(|| {
        format!(
            "소켓 주소 설정이 유효하지 않습니다 ({}:{}). API_HOST, API_PORT 환경변수를 확인하세요",
            config.host, config.port
        )
    })?;

    info!(database_url = %mask_database_url(&config.database_url), "DB 연결");
    let db = Database::connect(&DatabaseConfig::for_api(&config.database_url))
        .await
        .context("데이터베이스 연결 실패")?;

    let store = PgPriceStore::new(db.pool().clone());
    let state = Arc::new(AppState::new(Arc::new(store), config.max_daily_span_days));
    info!(version = %state.version, "애플리케이션 상태 초기화");

    let app = create_router(state, &config);

    info!(%addr, "API 서버 listening");
    info!("Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool().close().await;
    info!("서버 정상 종료");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
/// 진행 중인 요청은 끝까지 처리됩니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Ctrl+C 수신, graceful shutdown 시작");
        }
        _ = terminate => {
            warn!("SIGTERM 수신, graceful shutdown 시작");
        }
    }
}
