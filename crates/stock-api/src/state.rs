//! 애플리케이션 공유 상태.

use std::sync::Arc;

use stock_data::PriceStore;

/// 핸들러 간 공유 상태.
///
/// 저장소는 읽기 전용으로만 사용합니다.
#[derive(Clone)]
pub struct AppState {
    /// 가격 저장소
    pub store: Arc<dyn PriceStore>,
    /// 일봉 요청 최대 기간 (일)
    pub max_daily_span_days: i64,
    /// 애플리케이션 버전
    pub version: String,
}

impl AppState {
    pub fn new(store: Arc<dyn PriceStore>, max_daily_span_days: i64) -> Self {
        Self {
            store,
            max_daily_span_days,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) fn create_test_state(store: stock_data::MemoryPriceStore) -> AppState {
    AppState::new(Arc::new(store), 3650)
}
