//! 주가 OHLCV 도메인 코어.
//!
//! 저장소/네트워크에 의존하지 않는 순수 로직만 포함합니다.
//!
//! - [`Timeframe`], [`PriceRow`], [`DateRange`]: 도메인 타입
//! - [`diff::select_new`]: 증분 수집 필터
//! - [`aggregation`]: 일봉 → 주봉/월봉 집계 (기준 구현)
//! - [`swing`]: 스윙 포인트 감지

pub mod aggregation;
pub mod diff;
pub mod error;
pub mod price;
pub mod swing;
pub mod timeframe;

pub use aggregation::{aggregate, aggregated_range, bucket_start};
pub use diff::select_new;
pub use error::{CoreError, Result};
pub use price::{DateRange, PriceRow};
pub use swing::{detect_swings, SwingKind, SwingMarker};
pub use timeframe::Timeframe;
