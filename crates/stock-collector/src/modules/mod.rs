//! 데이터 수집 모듈.

pub mod price_sync;

pub use price_sync::{
    run_price_sync, sync_prices, sync_unit, PriceSyncOptions, SyncUnit, UnitReport, UnitResult,
};
