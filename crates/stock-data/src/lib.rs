//! 주가 OHLCV 저장 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - [`PriceStore`] trait: `(symbol, timeframe, date)` 키 기반 멱등 upsert와 조회
//! - [`PgPriceStore`]: PostgreSQL 구현 (UNNEST 배치 upsert, 집계 푸시다운)
//! - [`MemoryPriceStore`]: 메모리 구현
//! - [`Database`]: 연결 풀 설정
//!
//! # 예제
//!
//! ```rust,ignore
//! use stock_data::{Database, DatabaseConfig, PgPriceStore, PriceStore};
//!
//! let db = Database::connect(&DatabaseConfig::for_daemon(url)).await?;
//! let store = PgPriceStore::new(db.pool().clone());
//! store.ensure_schema().await?;
//! ```

pub mod database;
pub mod error;
pub mod storage;

pub use database::{mask_database_url, Database, DatabaseConfig};
pub use error::{DataError, Result};
pub use storage::{earliest_date, latest_date, MemoryPriceStore, PgPriceStore, PriceStore};
