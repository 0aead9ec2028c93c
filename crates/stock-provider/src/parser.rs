//! Alpha Vantage 시계열 페이로드 정규화.
//!
//! 날짜별 항목 중 필드가 없거나 형식이 잘못된 항목, `high < low` 항목은
//! 건너뛰고 나머지로 결과를 만듭니다. 결과는 항상 날짜 오름차순입니다.

use std::str::FromStr;

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use stock_core::{PriceRow, Timeframe};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::payload::series_key;

const OPEN_KEY: &str = "1. open";
const HIGH_KEY: &str = "2. high";
const LOW_KEY: &str = "3. low";
const CLOSE_KEY: &str = "4. close";
const VOLUME_KEY: &str = "5. volume";

/// 정규화 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// 시계열 섹션의 전체 항목 수
    pub total: usize,
    /// 필드 누락/형식 오류로 건너뛴 항목
    pub malformed: usize,
    /// `high < low` 등 불변식 위반으로 건너뛴 항목
    pub invalid: usize,
    /// 일봉 보존 기간 밖이라 제외한 항목
    pub out_of_window: usize,
}

/// 페이로드를 정규화합니다. 보존 기간 기준일은 현재 UTC 날짜입니다.
pub fn normalize(
    raw: &str,
    symbol: &str,
    timeframe: Timeframe,
    max_days_back: u32,
) -> Result<Vec<PriceRow>, ParseError> {
    normalize_as_of(raw, symbol, timeframe, max_days_back, Utc::now().date_naive())
        .map(|(rows, _)| rows)
}

/// 기준일을 지정해 페이로드를 정규화합니다.
///
/// 일봉이고 `max_days_back > 0`이면 `today - max_days_back` 이전 항목을 제외합니다.
pub fn normalize_as_of(
    raw: &str,
    symbol: &str,
    timeframe: Timeframe,
    max_days_back: u32,
    today: NaiveDate,
) -> Result<(Vec<PriceRow>, NormalizeStats), ParseError> {
    let root: Value =
        serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let key = series_key(timeframe);
    let series = root
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| ParseError::MissingSeries {
            key: key.to_string(),
        })?;

    let cutoff = (timeframe == Timeframe::Daily && max_days_back > 0)
        .then(|| today.checked_sub_days(Days::new(u64::from(max_days_back))))
        .flatten();

    let mut stats = NormalizeStats {
        total: series.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(series.len());

    for (date_str, entry) in series {
        let Some(row) = parse_entry(symbol, timeframe, date_str, entry) else {
            stats.malformed += 1;
            continue;
        };

        if row.validate().is_err() {
            stats.invalid += 1;
            continue;
        }

        if cutoff.is_some_and(|c| row.date < c) {
            stats.out_of_window += 1;
            continue;
        }

        rows.push(row);
    }

    rows.sort_by_key(|r| r.date);

    if stats.malformed > 0 || stats.invalid > 0 {
        warn!(
            symbol,
            timeframe = %timeframe,
            malformed = stats.malformed,
            invalid = stats.invalid,
            "손상된 항목 건너뜀"
        );
    }
    debug!(
        symbol,
        timeframe = %timeframe,
        total = stats.total,
        parsed = rows.len(),
        out_of_window = stats.out_of_window,
        "페이로드 정규화 완료"
    );

    Ok((rows, stats))
}

fn parse_entry(symbol: &str, timeframe: Timeframe, date: &str, entry: &Value) -> Option<PriceRow> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let fields = entry.as_object()?;

    Some(PriceRow::new(
        symbol,
        timeframe,
        date,
        decimal_field(fields, OPEN_KEY)?,
        decimal_field(fields, HIGH_KEY)?,
        decimal_field(fields, LOW_KEY)?,
        decimal_field(fields, CLOSE_KEY)?,
        volume_field(fields)?,
    ))
}

fn decimal_field(fields: &Map<String, Value>, key: &str) -> Option<Decimal> {
    Decimal::from_str(fields.get(key)?.as_str()?.trim()).ok()
}

fn volume_field(fields: &Map<String, Value>) -> Option<i64> {
    fields.get(VOLUME_KEY)?.as_str()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(open: &str, high: &str, low: &str, close: &str, volume: &str) -> String {
        format!(
            r#"{{"1. open": "{open}", "2. high": "{high}", "3. low": "{low}", "4. close": "{close}", "5. volume": "{volume}"}}"#
        )
    }

    fn daily_payload(entries: &[(&str, String)]) -> String {
        let body: Vec<String> = entries
            .iter()
            .map(|(d, e)| format!(r#""{d}": {e}"#))
            .collect();
        format!(
            r#"{{"Meta Data": {{"2. Symbol": "IBM"}}, "Time Series (Daily)": {{{}}}}}"#,
            body.join(", ")
        )
    }

    #[test]
    fn test_rows_sorted_ascending() {
        let raw = daily_payload(&[
            ("2025-01-06", entry("3", "4", "2", "3.5", "300")),
            ("2025-01-02", entry("1", "2", "0.5", "1.5", "100")),
            ("2025-01-03", entry("2", "3", "1", "2.5", "200")),
        ]);

        let (rows, stats) =
            normalize_as_of(&raw, "ibm", Timeframe::Daily, 0, date(2025, 2, 1)).unwrap();

        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2025, 1, 2), date(2025, 1, 3), date(2025, 1, 6)]);
        assert_eq!(rows[0].symbol, "IBM");
        assert_eq!(rows[0].open, dec!(1));
        assert_eq!(rows[0].close, dec!(1.5));
        assert_eq!(rows[2].volume, 300);
        assert_eq!(stats.total, 3);
    }

    #[test]
    fn test_skips_high_below_low_and_malformed() {
        let raw = daily_payload(&[
            ("2025-01-02", entry("1", "2", "0.5", "1.5", "100")),
            // high < low
            ("2025-01-03", entry("2", "1", "3", "2.5", "200")),
            // 숫자 아님
            ("2025-01-06", entry("abc", "4", "2", "3.5", "300")),
            // 날짜 형식 오류
            ("01/07/2025", entry("3", "4", "2", "3.5", "300")),
            ("2025-01-08", r#"{"1. open": "3", "2. high": "4"}"#.to_string()),
            ("2025-01-09", entry("3", "4", "2", "3.5", "400")),
        ]);

        let (rows, stats) =
            normalize_as_of(&raw, "IBM", Timeframe::Daily, 0, date(2025, 2, 1)).unwrap();

        assert_eq!(stats.total, 6);
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.malformed, 3);
        assert_eq!(rows.len(), stats.total - stats.invalid - stats.malformed);
        assert!(rows.iter().all(|r| r.date != date(2025, 1, 3)));
    }

    #[test]
    fn test_daily_cutoff_is_inclusive() {
        let raw = daily_payload(&[
            ("2025-01-01", entry("1", "2", "0.5", "1.5", "100")),
            ("2025-01-02", entry("1", "2", "0.5", "1.5", "100")),
            ("2025-01-10", entry("1", "2", "0.5", "1.5", "100")),
        ]);

        // 2025-01-11 - 9일 = 2025-01-02
        let (rows, stats) =
            normalize_as_of(&raw, "IBM", Timeframe::Daily, 9, date(2025, 1, 11)).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date(2025, 1, 2));
        assert_eq!(stats.out_of_window, 1);
    }

    #[test]
    fn test_cutoff_ignored_for_weekly() {
        let raw = format!(
            r#"{{"Weekly Time Series": {{"2001-01-05": {}}}}}"#,
            entry("1", "2", "0.5", "1.5", "100")
        );

        let (rows, _) =
            normalize_as_of(&raw, "IBM", Timeframe::Weekly, 30, date(2025, 1, 11)).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timeframe, Timeframe::Weekly);
    }

    #[test]
    fn test_missing_series_is_error() {
        let raw = r#"{"Note": "Thank you for using Alpha Vantage!"}"#;
        let err = normalize(raw, "IBM", Timeframe::Daily, 0).unwrap_err();
        assert!(matches!(err, ParseError::MissingSeries { key } if key == "Time Series (Daily)"));

        // 타임프레임과 섹션이 맞지 않는 경우
        let raw = daily_payload(&[("2025-01-02", entry("1", "2", "0.5", "1.5", "100"))]);
        assert!(matches!(
            normalize(&raw, "IBM", Timeframe::Monthly, 0),
            Err(ParseError::MissingSeries { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            normalize("not json", "IBM", Timeframe::Daily, 0),
            Err(ParseError::InvalidJson(_))
        ));
    }
}
