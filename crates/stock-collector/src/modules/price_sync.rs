//! 가격 수집 모듈.
//!
//! `(symbol, timeframe)` 단위를 하나씩 순차 처리합니다.
//!
//! ```text
//! fetch → normalize → max_date → select_new → upsert
//! ```
//!
//! 단위 실패는 [`UnitResult`]로 기록되고 다음 단위 처리를 막지 않습니다.
//! 최종 통계와 종료 코드는 [`CollectionStats::from_results`]가 결정합니다.

use std::time::{Duration, Instant};

use stock_core::{select_new, Timeframe};
use stock_data::PriceStore;
use stock_provider::{normalize, TimeSeriesSource};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{CollectionStats, CollectorError, Result};

/// 수집 단위.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncUnit {
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl SyncUnit {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
        }
    }
}

/// 성공한 단위의 처리 결과.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitReport {
    /// 정규화된 행 수
    pub parsed: usize,
    /// 마지막 저장일 이후 새 행 수
    pub new: usize,
    /// upsert 된 행 수
    pub upserted: usize,
}

/// 단위 실행 결과.
#[derive(Debug)]
pub struct UnitResult {
    pub unit: SyncUnit,
    pub outcome: Result<UnitReport>,
}

/// 수집 옵션.
#[derive(Debug, Clone)]
pub struct PriceSyncOptions {
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    pub max_days_back: u32,
    /// 단위 사이 고정 딜레이 (성공/실패 무관)
    pub request_delay: Duration,
}

impl PriceSyncOptions {
    /// 심볼 순, 심볼 안에서 타임프레임 순으로 단위 목록 생성.
    pub fn units(&self) -> Vec<SyncUnit> {
        self.symbols
            .iter()
            .flat_map(|symbol| {
                self.timeframes
                    .iter()
                    .map(move |tf| SyncUnit::new(symbol.clone(), *tf))
            })
            .collect()
    }
}

/// 단위 하나를 처리합니다.
///
/// 취소 신호는 fetch 단계에서만 반영됩니다. upsert가 시작되면 트랜잭션은
/// 끝까지 진행합니다.
pub async fn sync_unit(
    source: &dyn TimeSeriesSource,
    store: &dyn PriceStore,
    unit: &SyncUnit,
    max_days_back: u32,
    cancel: &CancellationToken,
) -> Result<UnitReport> {
    let SyncUnit { symbol, timeframe } = unit;

    let raw = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
        fetched = source.fetch(symbol, *timeframe) => fetched?,
    };

    let rows = normalize(&raw, symbol, *timeframe, max_days_back)?;
    let parsed = rows.len();

    let last_stored = store.max_date(symbol, *timeframe).await?;
    let new_rows = select_new(rows, last_stored);
    let new = new_rows.len();

    let upserted = if new_rows.is_empty() {
        0
    } else {
        store.upsert(&new_rows).await?
    };

    info!(
        symbol = %symbol,
        timeframe = %timeframe,
        parsed,
        new,
        upserted,
        last_stored = ?last_stored,
        "단위 수집 완료"
    );

    Ok(UnitReport {
        parsed,
        new,
        upserted,
    })
}

/// 전체 단위를 순차 실행하고 결과 목록을 반환합니다.
///
/// 취소 신호를 받으면 남은 단위는 `Cancelled`로 기록합니다.
pub async fn run_price_sync(
    source: &dyn TimeSeriesSource,
    store: &dyn PriceStore,
    options: &PriceSyncOptions,
    cancel: &CancellationToken,
) -> Vec<UnitResult> {
    let units = options.units();
    let total = units.len();
    let mut results = Vec::with_capacity(total);

    info!(
        units = total,
        symbols = options.symbols.len(),
        timeframes = options.timeframes.len(),
        "가격 수집 시작"
    );

    for (idx, unit) in units.into_iter().enumerate() {
        if cancel.is_cancelled() {
            results.push(UnitResult {
                unit,
                outcome: Err(CollectorError::Cancelled),
            });
            continue;
        }

        // 첫 단위 이후에만 딜레이
        if idx > 0 && !options.request_delay.is_zero() {
            debug!(delay_ms = options.request_delay.as_millis() as u64, "다음 요청 대기");
            tokio::select! {
                _ = cancel.cancelled() => {
                    results.push(UnitResult {
                        unit,
                        outcome: Err(CollectorError::Cancelled),
                    });
                    continue;
                }
                _ = tokio::time::sleep(options.request_delay) => {}
            }
        }

        let outcome = sync_unit(source, store, &unit, options.max_days_back, cancel).await;

        match &outcome {
            Ok(_) => {}
            Err(CollectorError::Cancelled) => {
                warn!(symbol = %unit.symbol, timeframe = %unit.timeframe, "취소됨");
            }
            Err(e) => {
                error!(
                    symbol = %unit.symbol,
                    timeframe = %unit.timeframe,
                    progress = format!("{}/{}", idx + 1, total),
                    error = %e,
                    "단위 수집 실패"
                );
            }
        }

        results.push(UnitResult { unit, outcome });
    }

    results
}

/// 가격 수집을 실행하고 통계를 반환합니다.
pub async fn sync_prices(
    source: &dyn TimeSeriesSource,
    store: &dyn PriceStore,
    options: &PriceSyncOptions,
    cancel: &CancellationToken,
) -> CollectionStats {
    let start = Instant::now();
    let results = run_price_sync(source, store, options, cancel).await;
    CollectionStats::from_results(&results, start.elapsed())
}
