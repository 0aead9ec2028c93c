//! 메모리 기반 가격 저장소.
//!
//! PostgreSQL 없이 동일한 계약(멱등 upsert, 원자적 배치)을 제공합니다.
//! 수집기/API 테스트에서 사용합니다.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use stock_core::{DateRange, PriceRow, Timeframe};
use tokio::sync::RwLock;
use tracing::debug;

use super::{dedupe_batch, PriceStore};
use crate::error::Result;

type PriceKey = (String, Timeframe, NaiveDate);

/// 메모리 가격 저장소.
///
/// 하나의 `RwLock` 아래에서 배치를 적용하므로 reader는
/// 배치 이전 또는 이후 상태만 관찰합니다.
#[derive(Default)]
pub struct MemoryPriceStore {
    rows: RwLock<BTreeMap<PriceKey, PriceRow>>,
}

impl MemoryPriceStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 전체 행 수.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// 비어 있는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// 전체 행 스냅샷 (키 순서).
    pub async fn snapshot(&self) -> Vec<PriceRow> {
        self.rows.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn max_date(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<NaiveDate>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|r| r.symbol == symbol && r.timeframe == timeframe)
            .map(|r| r.date)
            .max())
    }

    async fn upsert(&self, rows: &[PriceRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        // 적용 전에 전체 검증 → 실패 시 아무것도 쓰지 않음
        for row in rows {
            row.validate()?;
        }

        let batch = dedupe_batch(rows);
        let mut store = self.rows.write().await;
        for row in &batch {
            store.insert(
                (row.symbol.clone(), row.timeframe, row.date),
                (*row).clone(),
            );
        }

        debug!(rows = batch.len(), "메모리 저장소 upsert");
        Ok(batch.len())
    }

    async fn range(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<DateRange>> {
        let rows = self.rows.read().await;
        let dates = rows
            .values()
            .filter(|r| r.symbol == symbol && r.timeframe == timeframe)
            .map(|r| r.date);
        Ok(DateRange::from_dates(symbol, timeframe, dates))
    }

    async fn symbols(&self) -> Result<Vec<String>> {
        let rows = self.rows.read().await;
        let set: BTreeSet<&str> = rows.keys().map(|(s, _, _)| s.as_str()).collect();
        Ok(set.into_iter().map(str::to_string).collect())
    }

    async fn prices(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRow>> {
        let rows = self.rows.read().await;
        // 키가 (symbol, timeframe, date) 순이므로 이미 날짜 오름차순
        Ok(rows
            .values()
            .filter(|r| {
                r.symbol == symbol && r.timeframe == timeframe && r.date >= from && r.date <= to
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(symbol: &str, tf: Timeframe, d: NaiveDate, close: rust_decimal::Decimal) -> PriceRow {
        PriceRow::new(symbol, tf, d, close, close + dec!(1), close - dec!(1), close, 1_000)
    }

    #[tokio::test]
    async fn test_upsert_twice_is_idempotent() {
        let store = MemoryPriceStore::new();
        let batch = vec![
            row("AAPL", Timeframe::Daily, date(2025, 1, 2), dec!(100)),
            row("AAPL", Timeframe::Daily, date(2025, 1, 3), dec!(101)),
        ];

        store.upsert(&batch).await.unwrap();
        let first = store.snapshot().await;

        store.upsert(&batch).await.unwrap();
        let second = store.snapshot().await;

        assert_eq!(first, second);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_values_not_keys() {
        let store = MemoryPriceStore::new();
        let d = date(2025, 1, 2);

        store
            .upsert(&[row("AAPL", Timeframe::Daily, d, dec!(100))])
            .await
            .unwrap();
        store
            .upsert(&[row("AAPL", Timeframe::Daily, d, dec!(120))])
            .await
            .unwrap();

        let rows = store.prices("AAPL", Timeframe::Daily, d, d).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].close, dec!(120));
    }

    #[tokio::test]
    async fn test_invalid_row_aborts_whole_batch() {
        let store = MemoryPriceStore::new();
        let mut bad = row("AAPL", Timeframe::Daily, date(2025, 1, 3), dec!(10));
        bad.low = dec!(50);

        let batch = vec![row("AAPL", Timeframe::Daily, date(2025, 1, 2), dec!(10)), bad];

        assert!(store.upsert(&batch).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_range_absent_then_present() {
        let store = MemoryPriceStore::new();
        assert!(store.range("MSFT", Timeframe::Daily).await.unwrap().is_none());

        store
            .upsert(&[
                row("MSFT", Timeframe::Daily, date(2025, 1, 2), dec!(10)),
                row("MSFT", Timeframe::Daily, date(2025, 1, 6), dec!(11)),
                row("MSFT", Timeframe::Weekly, date(2025, 1, 6), dec!(11)),
            ])
            .await
            .unwrap();

        let range = store.range("MSFT", Timeframe::Daily).await.unwrap().unwrap();
        assert_eq!(range.min_date, date(2025, 1, 2));
        assert_eq!(range.max_date, date(2025, 1, 6));
        assert_eq!(range.row_count, 2);

        assert_eq!(
            store.max_date("MSFT", Timeframe::Weekly).await.unwrap(),
            Some(date(2025, 1, 6))
        );
    }

    #[tokio::test]
    async fn test_stored_weekly_and_derived_weekly_coexist() {
        let store = MemoryPriceStore::new();
        // 프로바이더에서 직접 받은 주봉 (금요일 날짜)
        store
            .upsert(&[
                row("IBM", Timeframe::Weekly, date(2025, 1, 10), dec!(50)),
                row("IBM", Timeframe::Daily, date(2025, 1, 7), dec!(40)),
                row("IBM", Timeframe::Daily, date(2025, 1, 9), dec!(42)),
            ])
            .await
            .unwrap();

        let derived = store
            .aggregated_prices("IBM", Timeframe::Weekly, date(2025, 1, 1), date(2025, 1, 31))
            .await
            .unwrap();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].date, date(2025, 1, 6));
        assert_eq!(derived[0].close, dec!(42));

        let stored = store
            .prices("IBM", Timeframe::Weekly, date(2025, 1, 1), date(2025, 1, 31))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].date, date(2025, 1, 10));
    }

    #[tokio::test]
    async fn test_symbols_are_distinct_and_sorted() {
        let store = MemoryPriceStore::new();
        store
            .upsert(&[
                row("TSLA", Timeframe::Daily, date(2025, 1, 2), dec!(10)),
                row("AAPL", Timeframe::Daily, date(2025, 1, 2), dec!(10)),
                row("AAPL", Timeframe::Monthly, date(2025, 1, 1), dec!(10)),
            ])
            .await
            .unwrap();

        assert_eq!(store.symbols().await.unwrap(), vec!["AAPL", "TSLA"]);
    }
}
