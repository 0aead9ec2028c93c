//! 외부 시계열 프로바이더 (Alpha Vantage).
//!
//! 이 crate는 다음을 제공합니다:
//! - [`TimeSeriesSource`]: `(symbol, timeframe)` 단위 원본 페이로드 조회 trait
//! - [`AlphaVantageClient`]: 재시도/백오프와 응답 분류를 포함한 구현
//! - [`normalize`]: 페이로드 → 검증된 [`stock_core::PriceRow`] 목록
//!
//! # 예제
//!
//! ```rust,ignore
//! use stock_provider::{normalize, AlphaVantageClient, AlphaVantageConfig, TimeSeriesSource};
//!
//! let client = AlphaVantageClient::new(AlphaVantageConfig::new(api_key))?;
//! let raw = client.fetch("IBM", Timeframe::Daily).await?;
//! let rows = normalize(&raw, "IBM", Timeframe::Daily, 3650)?;
//! ```

pub mod client;
pub mod error;
pub mod parser;
pub mod payload;
pub mod retry;

pub use client::{AlphaVantageClient, AlphaVantageConfig, TimeSeriesSource, DEFAULT_BASE_URL};
pub use error::{FetchError, ParseError};
pub use parser::{normalize, normalize_as_of, NormalizeStats};
pub use payload::ProviderPayload;
pub use retry::{with_retry, RetryConfig};
