//! 주가 OHLCV 수집기.
//!
//! 설정된 심볼 × 타임프레임 조합을 순차적으로 수집해 가격 저장소에 반영합니다.
//! 단위 실패는 집계만 하고 나머지 단위는 계속 진행합니다.

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::{CollectorConfig, PriceSyncConfig, ProviderConfig};
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
