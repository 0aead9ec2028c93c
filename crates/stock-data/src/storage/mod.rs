//! 가격 저장소 추상화.
//!
//! 수집기(단일 writer)와 API 서버(다중 reader)가 같은 trait를 사용합니다.
//!
//! - [`PgPriceStore`]: PostgreSQL 구현 (운영)
//! - [`MemoryPriceStore`]: 메모리 구현 (테스트, 로컬 실행)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use stock_core::{aggregate, aggregated_range, DateRange, PriceRow, Timeframe};

use crate::error::Result;

pub use memory::MemoryPriceStore;
pub use postgres::PgPriceStore;

/// 전체 구간 조회용 시작일 (1900-01-01).
pub fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
}

/// 전체 구간 조회용 종료일 (9999-12-31).
pub fn latest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// `(symbol, timeframe, date)` 키 기반 멱등 가격 저장소.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// 키의 마지막 저장 날짜. 데이터가 없으면 `None`.
    async fn max_date(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<NaiveDate>>;

    /// 행 배치를 upsert 합니다.
    ///
    /// 같은 키가 있으면 OHLCV 필드만 덮어씁니다. 배치는 원자적이며
    /// 하나라도 실패하면 아무것도 반영되지 않습니다.
    /// 반환값은 반영된 행 수 (배치 내 중복 키는 마지막 행 하나로 계산).
    async fn upsert(&self, rows: &[PriceRow]) -> Result<usize>;

    /// 키의 저장 범위 요약. 데이터가 없으면 `None`.
    async fn range(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<DateRange>>;

    /// 저장된 서로 다른 심볼 목록 (오름차순).
    async fn symbols(&self) -> Result<Vec<String>>;

    /// `[from, to]` 구간의 저장된 행 (날짜 오름차순).
    async fn prices(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRow>>;

    /// `[from, to]` 구간의 일봉을 주봉/월봉으로 집계합니다.
    ///
    /// 기본 구현은 일봉을 읽어 메모리에서 집계합니다.
    async fn aggregated_prices(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRow>> {
        let daily = self.prices(symbol, Timeframe::Daily, from, to).await?;
        Ok(aggregate(&daily, timeframe))
    }

    /// 일봉 전체에서 파생한 주봉/월봉 범위. 일봉이 없으면 `None`.
    async fn aggregated_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Option<DateRange>> {
        let daily = self
            .prices(symbol, Timeframe::Daily, earliest_date(), latest_date())
            .await?;
        Ok(aggregated_range(
            symbol,
            timeframe,
            daily.iter().map(|r| r.date),
        ))
    }
}

/// 배치 내 중복 키를 제거합니다 (마지막 행 우선, 첫 등장 순서 유지).
pub(crate) fn dedupe_batch(rows: &[PriceRow]) -> Vec<&PriceRow> {
    use std::collections::HashMap;

    let mut index: HashMap<(&str, Timeframe, NaiveDate), usize> = HashMap::new();
    let mut out: Vec<&PriceRow> = Vec::with_capacity(rows.len());

    for row in rows {
        let key = (row.symbol.as_str(), row.timeframe, row.date);
        match index.get(&key) {
            Some(&pos) => out[pos] = row,
            None => {
                index.insert(key, out.len());
                out.push(row);
            }
        }
    }

    out
}
