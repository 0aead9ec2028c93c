//! 수집 통계 구조체.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CollectorError;
use crate::modules::UnitResult;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 단위 수 (symbol × timeframe)
    pub total: usize,
    /// 성공 단위 수 (skipped 포함)
    pub success: usize,
    /// 실패 단위 수
    pub errors: usize,
    /// 새 데이터가 없어 저장하지 않은 단위 수
    pub skipped: usize,
    /// 취소로 실행하지 않은 단위 수
    pub cancelled: usize,
    /// 저장된 총 행 수
    pub total_rows: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 단위 결과 하나를 반영합니다.
    pub fn record(&mut self, result: &UnitResult) {
        self.total += 1;
        match &result.outcome {
            Ok(report) => {
                self.success += 1;
                self.total_rows += report.upserted;
                if report.upserted == 0 {
                    self.skipped += 1;
                }
            }
            Err(CollectorError::Cancelled) => self.cancelled += 1,
            Err(_) => self.errors += 1,
        }
    }

    /// 단위 결과 목록을 통계로 집계합니다.
    pub fn from_results<'a, I>(results: I, elapsed: Duration) -> Self
    where
        I: IntoIterator<Item = &'a UnitResult>,
    {
        let mut stats = results.into_iter().fold(Self::new(), |mut acc, r| {
            acc.record(r);
            acc
        });
        stats.elapsed = elapsed;
        stats
    }

    /// 모든 단위가 성공했는지 여부 (실패/취소가 하나라도 있으면 false)
    pub fn is_complete_success(&self) -> bool {
        self.errors == 0 && self.cancelled == 0
    }

    /// 성공률 계산 (%)
    ///
    /// 취소된 단위는 분모에서 제외.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total.saturating_sub(self.cancelled);
        if attempted == 0 {
            0.0
        } else {
            (self.success as f64 / attempted as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            cancelled = self.cancelled,
            total_rows = self.total_rows,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use stock_core::Timeframe;
    use stock_provider::FetchError;

    use super::*;
    use crate::modules::{SyncUnit, UnitReport};

    fn ok(upserted: usize) -> UnitResult {
        UnitResult {
            unit: SyncUnit::new("AAPL", Timeframe::Daily),
            outcome: Ok(UnitReport {
                parsed: upserted,
                new: upserted,
                upserted,
            }),
        }
    }

    fn failed(err: CollectorError) -> UnitResult {
        UnitResult {
            unit: SyncUnit::new("MSFT", Timeframe::Weekly),
            outcome: Err(err),
        }
    }

    #[test]
    fn test_reducer_counts() {
        let results = vec![
            ok(5),
            ok(0),
            failed(CollectorError::Fetch(FetchError::InvalidRequest("bad".into()))),
            failed(CollectorError::Cancelled),
        ];

        let stats = CollectionStats::from_results(&results, Duration::from_secs(1));

        assert_eq!(stats.total, 4);
        assert_eq!(stats.success, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.total_rows, 5);
        assert!(!stats.is_complete_success());
    }

    #[test]
    fn test_all_success() {
        let stats = CollectionStats::from_results(&[ok(1), ok(0)], Duration::ZERO);
        assert!(stats.is_complete_success());
        assert_eq!(stats.success_rate(), 100.0);
    }

    #[test]
    fn test_empty_run_is_success() {
        let results: Vec<UnitResult> = Vec::new();
        let stats = CollectionStats::from_results(&results, Duration::ZERO);
        assert!(stats.is_complete_success());
        assert_eq!(stats.success_rate(), 0.0);
    }
}
