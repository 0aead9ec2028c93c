//! Standalone price collector CLI.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use stock_collector::{
    config::{database_url_from_env, parse_symbol_list, parse_timeframe_list},
    modules::{self, PriceSyncOptions},
    CollectorConfig, CollectorError, Result,
};
use stock_core::Timeframe;
use stock_data::{mask_database_url, Database, DatabaseConfig, PgPriceStore, PriceStore};
use stock_provider::AlphaVantageClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "stock-collector")]
#[command(about = "Stock Viewer OHLCV Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// 로그 형식
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// 설정된 심볼 × 타임프레임 가격 수집
    Sync {
        /// 대상 심볼 (쉼표로 구분, 예: "AAPL,MSFT"). 지정 시 STOCK_SYMBOLS 대신 사용
        #[arg(long)]
        symbols: Option<String>,

        /// 대상 타임프레임 (쉼표로 구분, 예: "D,W"). 지정 시 TIMEFRAMES 대신 사용
        #[arg(long)]
        timeframes: Option<String>,
    },

    /// stock_prices 스키마 생성
    Migrate,

    /// 저장된 데이터 범위 조회
    Range {
        #[arg(long)]
        symbol: String,

        #[arg(long)]
        timeframe: String,
    },
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "stock_collector={},stock_provider={},stock_data={}",
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

async fn connect_store(database_url: &str) -> Result<(Database, PgPriceStore)> {
    tracing::debug!(database_url = %mask_database_url(database_url), "DB 연결");

    let db = Database::connect(&DatabaseConfig::for_daemon(database_url))
        .await
        .map_err(|e| CollectorError::Config(format!("데이터베이스 연결 실패: {}", e)))?;
    let store = PgPriceStore::new(db.pool().clone());
    Ok((db, store))
}

async fn run_sync(symbols: Option<String>, timeframes: Option<String>) -> Result<ExitCode> {
    // 설정 오류는 단위 실행 전에 전체 실행을 중단
    let config = CollectorConfig::from_env()?;

    let mut options = PriceSyncOptions {
        symbols: config.price_sync.symbols.clone(),
        timeframes: config.price_sync.timeframes.clone(),
        max_days_back: config.price_sync.max_days_back,
        request_delay: config.price_sync.request_delay(),
    };
    if let Some(raw) = symbols {
        options.symbols = parse_symbol_list(&raw)?;
    }
    if let Some(raw) = timeframes {
        options.timeframes = parse_timeframe_list(&raw)?;
    }

    let client = AlphaVantageClient::new(config.alpha_vantage_config())
        .map_err(|e| CollectorError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;
    let (db, store) = connect_store(&config.database_url).await?;
    store.ensure_schema().await?;

    // Ctrl+C: 진행 중인 단위는 끝까지, 남은 단위는 취소
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("종료 신호 수신, 남은 단위 취소");
            signal_token.cancel();
        }
    });

    let stats = modules::sync_prices(&client, &store, &options, &cancel).await;
    stats.log_summary("가격 수집");

    db.pool().close().await;

    Ok(if stats.is_complete_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_migrate() -> Result<ExitCode> {
    let database_url = database_url_from_env()?;
    let (db, store) = connect_store(&database_url).await?;
    store.ensure_schema().await?;
    db.pool().close().await;
    println!("✅ stock_prices 스키마 준비 완료");
    Ok(ExitCode::SUCCESS)
}

async fn run_range(symbol: String, timeframe: String) -> Result<ExitCode> {
    let timeframe = timeframe
        .parse::<Timeframe>()
        .map_err(|e| CollectorError::Config(e.to_string()))?;
    let symbol = symbol.trim().to_uppercase();

    let database_url = database_url_from_env()?;
    let (db, store) = connect_store(&database_url).await?;
    let range = store.range(&symbol, timeframe).await?;
    db.pool().close().await;

    match range {
        Some(r) => println!(
            "{} [{}] {} ~ {} ({}건)",
            r.symbol, r.timeframe, r.min_date, r.max_date, r.row_count
        ),
        None => println!("{} [{}] 데이터 없음", symbol, timeframe),
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    tracing::info!("Stock Viewer Collector 시작");

    let result = match cli.command {
        Commands::Sync {
            symbols,
            timeframes,
        } => run_sync(symbols, timeframes).await,
        Commands::Migrate => run_migrate().await,
        Commands::Range { symbol, timeframe } => run_range(symbol, timeframe).await,
    };

    match result {
        Ok(code) => {
            tracing::info!("Stock Viewer Collector 종료");
            code
        }
        Err(e) => {
            tracing::error!(error = %e, "실행 실패");
            ExitCode::FAILURE
        }
    }
}
