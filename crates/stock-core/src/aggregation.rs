//! 일봉 → 주봉/월봉 집계.
//!
//! 주봉/월봉은 항상 일봉에서 파생됩니다. 이 모듈은 메모리 내 기준 구현이며,
//! DB 푸시다운 쿼리(`stock-data`)는 이 결과와 동일해야 합니다.
//!
//! # 버킷 규칙
//!
//! - 주봉: 해당 날짜가 속한 주의 월요일
//! - 월봉: 해당 월의 1일
//!
//! # 롤업 규칙
//!
//! | 필드 | 값 |
//! |------|----|
//! | open | 버킷 내 가장 이른 날짜의 open |
//! | close | 버킷 내 가장 늦은 날짜의 close |
//! | high | 버킷 내 high 최댓값 |
//! | low | 버킷 내 low 최솟값 |
//! | volume | 버킷 내 volume 합계 |

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::{DateRange, PriceRow, Timeframe};

/// 날짜가 속한 기간 버킷의 시작일.
///
/// 일봉은 날짜 자신이 버킷입니다.
pub fn bucket_start(date: NaiveDate, timeframe: Timeframe) -> NaiveDate {
    match timeframe {
        Timeframe::Daily => date,
        Timeframe::Weekly => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        Timeframe::Monthly => date.with_day(1).unwrap_or(date),
    }
}

/// 버킷 하나의 누적 상태.
struct BucketAcc {
    first_date: NaiveDate,
    last_date: NaiveDate,
    open: Decimal,
    close: Decimal,
    high: Decimal,
    low: Decimal,
    volume: i64,
}

impl BucketAcc {
    fn new(row: &PriceRow) -> Self {
        Self {
            first_date: row.date,
            last_date: row.date,
            open: row.open,
            close: row.close,
            high: row.high,
            low: row.low,
            volume: row.volume,
        }
    }

    fn push(&mut self, row: &PriceRow) {
        if row.date < self.first_date {
            self.first_date = row.date;
            self.open = row.open;
        }
        if row.date > self.last_date {
            self.last_date = row.date;
            self.close = row.close;
        }
        self.high = self.high.max(row.high);
        self.low = self.low.min(row.low);
        self.volume = self.volume.saturating_add(row.volume);
    }
}

/// 일봉 행을 주봉/월봉 캔들로 집계합니다.
///
/// 입력 순서와 무관하게 결과는 버킷 시작일 오름차순입니다.
/// 결과 행의 `date`는 버킷 시작일, `timeframe`은 요청한 타임프레임입니다.
/// `Timeframe::Daily`를 요청하면 입력을 날짜순으로 정렬해 그대로 반환합니다.
pub fn aggregate(daily: &[PriceRow], timeframe: Timeframe) -> Vec<PriceRow> {
    if timeframe == Timeframe::Daily {
        let mut rows = daily.to_vec();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        return rows;
    }

    let mut buckets: BTreeMap<(NaiveDate, &str), BucketAcc> = BTreeMap::new();

    for row in daily {
        let key = (bucket_start(row.date, timeframe), row.symbol.as_str());
        buckets
            .entry(key)
            .and_modify(|acc| acc.push(row))
            .or_insert_with(|| BucketAcc::new(row));
    }

    buckets
        .into_iter()
        .map(|((start, symbol), acc)| PriceRow {
            symbol: symbol.to_string(),
            timeframe,
            date: start,
            open: acc.open,
            high: acc.high,
            low: acc.low,
            close: acc.close,
            volume: acc.volume,
        })
        .collect()
}

/// 일봉 날짜 집합에서 파생 타임프레임의 범위를 계산합니다.
///
/// min/max는 버킷 시작일, row_count는 서로 다른 버킷 수입니다.
/// 일봉이 하나도 없으면 `None`.
pub fn aggregated_range<I>(symbol: &str, timeframe: Timeframe, daily_dates: I) -> Option<DateRange>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let buckets: BTreeSet<NaiveDate> = daily_dates
        .into_iter()
        .map(|d| bucket_start(d, timeframe))
        .collect();

    DateRange::from_dates(symbol, timeframe, buckets)
}
