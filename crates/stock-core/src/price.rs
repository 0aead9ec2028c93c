//! OHLCV 가격 행과 날짜 범위 요약.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CoreError, Result, Timeframe};

/// 한 종목의 한 기간 캔들.
///
/// 저장소에서는 `(symbol, timeframe, date)`가 유일 키입니다.
/// 주봉/월봉 집계 결과도 같은 타입을 사용하며, 이때 `date`는 버킷 시작일입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRow {
    /// 종목 코드 (대문자)
    pub symbol: String,
    pub timeframe: Timeframe,
    /// 거래일 (시간 정보 없음)
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

impl PriceRow {
    /// 새 가격 행 생성. 심볼은 대문자로 정규화됩니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            timeframe,
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 저장 전 불변식 검사.
    ///
    /// - 심볼이 비어 있지 않을 것
    /// - high >= low
    /// - volume >= 0
    pub fn validate(&self) -> Result<()> {
        let reason = if self.symbol.is_empty() {
            Some("심볼이 비어 있음")
        } else if self.high < self.low {
            Some("high < low")
        } else if self.volume < 0 {
            Some("음수 거래량")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CoreError::InvalidRow {
                symbol: self.symbol.clone(),
                date: self.date,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// `(symbol, timeframe)` 키의 저장 범위 요약.
///
/// 데이터가 없으면 값 자체가 존재하지 않습니다 (`Option<DateRange>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub row_count: i64,
}

impl DateRange {
    /// 날짜 목록에서 범위를 계산합니다. 목록이 비어 있으면 `None`.
    ///
    /// 중복 날짜는 호출자가 제거해야 합니다.
    pub fn from_dates<I>(symbol: &str, timeframe: Timeframe, dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut iter = dates.into_iter();
        let first = iter.next()?;

        let (min_date, max_date, row_count) =
            iter.fold((first, first, 1_i64), |(min, max, count), d| {
                (min.min(d), max.max(d), count + 1)
            });

        Some(Self {
            symbol: symbol.to_string(),
            timeframe,
            min_date,
            max_date,
            row_count,
        })
    }
}
