//! 증분 수집 필터.
//!
//! 저장소의 마지막 날짜보다 엄격히 이후인 행만 남깁니다.
//! 저장소 조회(`max_date`)는 호출자가 먼저 수행합니다.

use chrono::NaiveDate;

use crate::PriceRow;

/// 새로 저장할 행만 선택.
///
/// `last_stored`가 `None`이면 최초 적재이므로 모든 행이 대상입니다.
/// 입력 순서는 유지됩니다.
pub fn select_new(rows: Vec<PriceRow>, last_stored: Option<NaiveDate>) -> Vec<PriceRow> {
    match last_stored {
        None => rows,
        Some(last) => rows.into_iter().filter(|r| r.date > last).collect(),
    }
}
