//! 주가 조회 endpoint.
//!
//! - `GET /api/stocks/symbols`: 저장된 심볼 목록
//! - `GET /api/stocks/prices`: 구간 캔들 (주봉/월봉은 일봉에서 즉석 집계)
//! - `GET /api/stocks/range`: 저장 범위 요약
//! - `GET /api/stocks/swings`: 스윙 포인트 마커

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stock_core::{detect_swings, DateRange, PriceRow, SwingKind, SwingMarker, Timeframe};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::error::{bad_request, data_fetch_error, ApiError, ApiResult};
use crate::state::AppState;
use crate::utils::deserialize_symbol;

/// `limit` 허용 최대값.
pub const MAX_LIMIT: usize = 10_000;
/// 스윙 윈도우 기본값.
pub const DEFAULT_SWING_WINDOW: usize = 3;
/// 스윙 윈도우 허용 최대값.
pub const MAX_SWING_WINDOW: usize = 50;

// ==================== 요청 타입 ====================

/// 가격 조회 쿼리.
///
/// 필수 값이 빠지면 핸들러가 `MISSING_PARAMETER`로 응답합니다.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PricesQuery {
    /// 종목 코드 (대소문자 무시)
    #[serde(default, deserialize_with = "deserialize_symbol")]
    #[param(required = true)]
    pub symbol: Option<String>,
    /// 타임프레임 (D, W, M)
    #[param(required = true)]
    pub timeframe: Option<String>,
    /// 시작일 (YYYY-MM-DD, 포함)
    #[param(required = true)]
    pub from: Option<String>,
    /// 종료일 (YYYY-MM-DD, 포함)
    #[param(required = true)]
    pub to: Option<String>,
    /// 최근 N개만 반환 (1..=10000)
    #[param(value_type = Option<u32>)]
    pub limit: Option<String>,
}

/// 범위 조회 쿼리.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RangeQuery {
    #[serde(default, deserialize_with = "deserialize_symbol")]
    #[param(required = true)]
    pub symbol: Option<String>,
    #[param(required = true)]
    pub timeframe: Option<String>,
}

/// 스윙 포인트 조회 쿼리.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SwingsQuery {
    #[serde(default, deserialize_with = "deserialize_symbol")]
    #[param(required = true)]
    pub symbol: Option<String>,
    #[param(required = true)]
    pub timeframe: Option<String>,
    #[param(required = true)]
    pub from: Option<String>,
    #[param(required = true)]
    pub to: Option<String>,
    /// 좌우 비교 캔들 수 (기본 3, 1..=50)
    #[param(value_type = Option<u32>)]
    pub window: Option<String>,
}

// ==================== 응답 타입 ====================

/// 캔들 응답.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceDto {
    pub symbol: String,
    pub timeframe: String,
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub close: Decimal,
    pub volume: i64,
}

impl From<PriceRow> for PriceDto {
    fn from(row: PriceRow) -> Self {
        Self {
            symbol: row.symbol,
            timeframe: row.timeframe.code().to_string(),
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// 저장 범위 응답.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeDto {
    pub symbol: String,
    pub timeframe: String,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub row_count: i64,
}

impl From<DateRange> for DateRangeDto {
    fn from(range: DateRange) -> Self {
        Self {
            symbol: range.symbol,
            timeframe: range.timeframe.code().to_string(),
            min_date: range.min_date,
            max_date: range.max_date,
            row_count: range.row_count,
        }
    }
}

/// 스윙 마커 응답.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwingDto {
    pub date: NaiveDate,
    /// `peak` 또는 `valley`
    pub kind: String,
}

impl From<SwingMarker> for SwingDto {
    fn from(marker: SwingMarker) -> Self {
        let kind = match marker.kind {
            SwingKind::Peak => "peak",
            SwingKind::Valley => "valley",
        };
        Self {
            date: marker.date,
            kind: kind.to_string(),
        }
    }
}

// ==================== 검증 ====================

/// 검증을 통과한 캔들 구간 요청.
#[derive(Debug)]
struct CandleWindow {
    symbol: String,
    timeframe: Timeframe,
    from: NaiveDate,
    to: NaiveDate,
}

/// 필수 쿼리 파라미터를 꺼냅니다.
fn required<'a>(
    name: &str,
    value: Option<&'a str>,
) -> Result<&'a str, (StatusCode, Json<ApiError>)> {
    value.ok_or_else(|| {
        bad_request(
            "MISSING_PARAMETER",
            format!("필수 파라미터 '{}'가 없습니다", name),
        )
    })
}

/// 양의 정수 쿼리 파라미터를 `1..=max` 범위로 파싱합니다.
fn parse_bounded(
    code: &str,
    name: &str,
    raw: &str,
    max: usize,
) -> Result<usize, (StatusCode, Json<ApiError>)> {
    match raw.trim().parse::<usize>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(bad_request(
            code,
            format!("{}은 1..={} 범위의 정수여야 합니다: '{}'", name, max, raw),
        )),
    }
}

fn parse_symbol(symbol: &str) -> Result<(), (StatusCode, Json<ApiError>)> {
    if symbol.is_empty() {
        return Err(bad_request("INVALID_SYMBOL", "symbol이 비어 있습니다"));
    }
    Ok(())
}

fn parse_timeframe(raw: &str) -> Result<Timeframe, (StatusCode, Json<ApiError>)> {
    raw.parse::<Timeframe>().map_err(|_| {
        bad_request(
            "INVALID_TIMEFRAME",
            format!("지원하지 않는 타임프레임: '{}' (D, W, M)", raw),
        )
    })
}

fn parse_date(name: &str, raw: &str) -> Result<NaiveDate, (StatusCode, Json<ApiError>)> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        bad_request(
            "INVALID_DATE",
            format!("'{}' 날짜 형식이 올바르지 않습니다: '{}' (YYYY-MM-DD)", name, raw),
        )
    })
}

fn validate_window(
    state: &AppState,
    symbol: Option<&str>,
    timeframe: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<CandleWindow, (StatusCode, Json<ApiError>)> {
    let symbol = required("symbol", symbol)?;
    let timeframe = required("timeframe", timeframe)?;
    let from = required("from", from)?;
    let to = required("to", to)?;

    parse_symbol(symbol)?;
    let timeframe = parse_timeframe(timeframe)?;
    let from = parse_date("from", from)?;
    let to = parse_date("to", to)?;

    if from > to {
        return Err(bad_request(
            "INVALID_RANGE",
            format!("from({})이 to({})보다 늦습니다", from, to),
        ));
    }

    if timeframe == Timeframe::Daily && (to - from).num_days() > state.max_daily_span_days {
        return Err(bad_request(
            "RANGE_TOO_LARGE",
            format!(
                "일봉 조회 기간이 너무 깁니다 (최대 {}일)",
                state.max_daily_span_days
            ),
        ));
    }

    Ok(CandleWindow {
        symbol: symbol.to_string(),
        timeframe,
        from,
        to,
    })
}

/// 구간 캔들을 읽습니다. 주봉/월봉은 일봉에서 집계합니다.
async fn load_candles(
    state: &AppState,
    window: &CandleWindow,
) -> Result<Vec<PriceRow>, (StatusCode, Json<ApiError>)> {
    let result = if window.timeframe.is_derived() {
        state
            .store
            .aggregated_prices(&window.symbol, window.timeframe, window.from, window.to)
            .await
    } else {
        state
            .store
            .prices(&window.symbol, window.timeframe, window.from, window.to)
            .await
    };

    result.map_err(data_fetch_error)
}

/// 최근 `limit`개만 남깁니다 (날짜 오름차순 유지).
fn keep_most_recent(mut rows: Vec<PriceRow>, limit: usize) -> Vec<PriceRow> {
    if rows.len() > limit {
        rows.drain(..rows.len() - limit);
    }
    rows
}

// ==================== 핸들러 ====================

/// 저장된 심볼 목록 조회.
#[utoipa::path(
    get,
    path = "/api/stocks/symbols",
    responses(
        (status = 200, description = "심볼 목록 (오름차순)", body = Vec<String>),
        (status = 502, description = "저장소 조회 실패", body = ApiError)
    ),
    tag = "stocks"
)]
pub async fn get_symbols(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    let symbols = state.store.symbols().await.map_err(data_fetch_error)?;
    debug!(count = symbols.len(), "심볼 목록 조회");
    Ok(Json(symbols))
}

/// 구간 캔들 조회.
///
/// 주봉/월봉은 저장된 일봉에서 즉석 집계하며 `date`는 버킷 시작일입니다.
#[utoipa::path(
    get,
    path = "/api/stocks/prices",
    params(PricesQuery),
    responses(
        (status = 200, description = "캔들 목록 (날짜 오름차순)", body = Vec<PriceDto>),
        (status = 400, description = "잘못된 요청", body = ApiError),
        (status = 502, description = "저장소 조회 실패", body = ApiError)
    ),
    tag = "stocks"
)]
pub async fn get_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PricesQuery>,
) -> ApiResult<Vec<PriceDto>> {
    let window = validate_window(
        &state,
        query.symbol.as_deref(),
        query.timeframe.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    )?;

    let limit = query
        .limit
        .as_deref()
        .map(|raw| parse_bounded("INVALID_LIMIT", "limit", raw, MAX_LIMIT))
        .transpose()?;

    let mut rows = load_candles(&state, &window).await?;
    if let Some(limit) = limit {
        rows = keep_most_recent(rows, limit);
    }

    debug!(
        symbol = %window.symbol,
        timeframe = %window.timeframe,
        count = rows.len(),
        "캔들 조회 성공"
    );

    Ok(Json(rows.into_iter().map(PriceDto::from).collect()))
}

/// 저장 범위 조회.
///
/// 주봉/월봉 범위는 일봉에서 파생한 버킷 기준입니다.
#[utoipa::path(
    get,
    path = "/api/stocks/range",
    params(RangeQuery),
    responses(
        (status = 200, description = "저장 범위", body = DateRangeDto),
        (status = 400, description = "잘못된 요청", body = ApiError),
        (status = 404, description = "데이터 없음", body = ApiError),
        (status = 502, description = "저장소 조회 실패", body = ApiError)
    ),
    tag = "stocks"
)]
pub async fn get_range(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<DateRangeDto> {
    let symbol = required("symbol", query.symbol.as_deref())?;
    let timeframe = required("timeframe", query.timeframe.as_deref())?;
    parse_symbol(symbol)?;
    let timeframe = parse_timeframe(timeframe)?;

    let range = if timeframe.is_derived() {
        state.store.aggregated_range(symbol, timeframe).await
    } else {
        state.store.range(symbol, timeframe).await
    }
    .map_err(data_fetch_error)?;

    match range {
        Some(range) => Ok(Json(DateRangeDto::from(range))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(
                "NOT_FOUND",
                format!("{} [{}] 데이터가 없습니다", symbol, timeframe),
            )),
        )),
    }
}

/// 스윙 포인트 조회.
///
/// `/prices`와 같은 캔들 시퀀스에 스윙 감지를 적용합니다.
#[utoipa::path(
    get,
    path = "/api/stocks/swings",
    params(SwingsQuery),
    responses(
        (status = 200, description = "스윙 마커 (날짜 오름차순)", body = Vec<SwingDto>),
        (status = 400, description = "잘못된 요청", body = ApiError),
        (status = 502, description = "저장소 조회 실패", body = ApiError)
    ),
    tag = "stocks"
)]
pub async fn get_swings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SwingsQuery>,
) -> ApiResult<Vec<SwingDto>> {
    let window = validate_window(
        &state,
        query.symbol.as_deref(),
        query.timeframe.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    )?;

    let size = match query.window.as_deref() {
        Some(raw) => parse_bounded("INVALID_WINDOW", "window", raw, MAX_SWING_WINDOW)?,
        None => DEFAULT_SWING_WINDOW,
    };

    let candles = load_candles(&state, &window).await?;
    let markers = detect_swings(&candles, size);

    debug!(
        symbol = %window.symbol,
        timeframe = %window.timeframe,
        candles = candles.len(),
        markers = markers.len(),
        "스윙 포인트 계산"
    );

    Ok(Json(markers.into_iter().map(SwingDto::from).collect()))
}

/// 주가 라우터 생성.
pub fn stocks_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/symbols", get(get_symbols))
        .route("/prices", get(get_prices))
        .route("/range", get(get_range))
        .route("/swings", get(get_swings))
}

// ==================== 테스트 ====================

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Datelike, Duration, Weekday};
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use stock_data::{MemoryPriceStore, PriceStore};
    use tower::ServiceExt;

    use super::*;
    use crate::state::create_test_state;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(symbol: &str, d: NaiveDate, high: Decimal, low: Decimal) -> PriceRow {
        PriceRow::new(symbol, Timeframe::Daily, d, low, high, low, high, 100)
    }

    /// 2025-01-06(월) ~ 2025-01-17(금) 평일 10개 일봉
    async fn seeded_store() -> MemoryPriceStore {
        let store = MemoryPriceStore::new();
        let highs = [10, 12, 15, 12, 10, 9, 11, 14, 11, 10];
        let mut rows = Vec::new();
        let mut d = date(2025, 1, 6);
        for h in highs {
            let high = Decimal::from(h);
            rows.push(daily("AAPL", d, high, high - dec!(2)));
            d += Duration::days(if d.weekday() == Weekday::Fri { 3 } else { 1 });
        }
        store.upsert(&rows).await.unwrap();
        store
    }

    fn app(store: MemoryPriceStore) -> Router {
        Router::new()
            .nest("/api/stocks", stocks_router())
            .with_state(Arc::new(create_test_state(store)))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_symbols_sorted() {
        let store = seeded_store().await;
        store
            .upsert(&[daily("MSFT", date(2025, 1, 6), dec!(5), dec!(4))])
            .await
            .unwrap();

        let (status, body) = call(app(store), "/api/stocks/symbols").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(["AAPL", "MSFT"]));
    }

    #[tokio::test]
    async fn test_prices_daily_ascending_and_normalized() {
        let (status, body) = call(
            app(seeded_store().await),
            "/api/stocks/prices?symbol=%20aapl&timeframe=d&from=2025-01-07&to=2025-01-09",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["date"], "2025-01-07");
        assert_eq!(rows[2]["date"], "2025-01-09");
        assert_eq!(rows[0]["symbol"], "AAPL");
        assert_eq!(rows[0]["timeframe"], "D");
        assert_eq!(rows[0]["high"].as_f64(), Some(12.0));
        assert_eq!(rows[0]["volume"], 100);
    }

    #[tokio::test]
    async fn test_prices_weekly_aggregated_from_daily() {
        let (status, body) = call(
            app(seeded_store().await),
            "/api/stocks/prices?symbol=AAPL&timeframe=W&from=2025-01-01&to=2025-01-31",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["date"], "2025-01-06");
        assert_eq!(rows[0]["timeframe"], "W");
        assert_eq!(rows[0]["high"].as_f64(), Some(15.0));
        assert_eq!(rows[0]["volume"], 500);
        assert_eq!(rows[1]["date"], "2025-01-13");
        assert_eq!(rows[1]["low"].as_f64(), Some(7.0));
    }

    #[tokio::test]
    async fn test_prices_limit_keeps_most_recent() {
        let (status, body) = call(
            app(seeded_store().await),
            "/api/stocks/prices?symbol=AAPL&timeframe=D&from=2025-01-01&to=2025-01-31&limit=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["date"], "2025-01-16");
        assert_eq!(rows[1]["date"], "2025-01-17");
    }

    #[tokio::test]
    async fn test_prices_empty_window_is_ok() {
        let (status, body) = call(
            app(seeded_store().await),
            "/api/stocks/prices?symbol=AAPL&timeframe=D&from=2024-01-01&to=2024-01-31",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_prices_validation_codes() {
        let cases = [
            ("timeframe=H&from=2025-01-01&to=2025-01-31", "INVALID_TIMEFRAME"),
            ("timeframe=D&from=2025-13-01&to=2025-01-31", "INVALID_DATE"),
            ("timeframe=D&from=2025-02-01&to=2025-01-31", "INVALID_RANGE"),
            ("timeframe=D&from=2010-01-01&to=2025-01-31", "RANGE_TOO_LARGE"),
            ("timeframe=D&from=2025-01-01&to=2025-01-31&limit=0", "INVALID_LIMIT"),
            ("timeframe=D&from=2025-01-01&to=2025-01-31&limit=10001", "INVALID_LIMIT"),
            ("timeframe=D&from=2025-01-01&to=2025-01-31&limit=ten", "INVALID_LIMIT"),
        ];

        for (params, code) in cases {
            let uri = format!("/api/stocks/prices?symbol=AAPL&{}", params);
            let (status, body) = call(app(MemoryPriceStore::new()), &uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", params);
            assert_eq!(body["code"], code, "{}", params);
        }
    }

    #[tokio::test]
    async fn test_long_span_allowed_for_monthly() {
        let (status, _) = call(
            app(seeded_store().await),
            "/api/stocks/prices?symbol=AAPL&timeframe=M&from=2000-01-01&to=2025-12-31",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_range_found_and_missing() {
        let app = app(seeded_store().await);

        let (status, body) = call(
            app.clone(),
            "/api/stocks/range?symbol=aapl&timeframe=D",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["minDate"], "2025-01-06");
        assert_eq!(body["maxDate"], "2025-01-17");
        assert_eq!(body["rowCount"], 10);

        let (status, body) = call(
            app.clone(),
            "/api/stocks/range?symbol=AAPL&timeframe=W",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["minDate"], "2025-01-06");
        assert_eq!(body["maxDate"], "2025-01-13");
        assert_eq!(body["rowCount"], 2);

        let (status, body) = call(app, "/api/stocks/range?symbol=TSLA&timeframe=D").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_swings_detected() {
        let (status, body) = call(
            app(seeded_store().await),
            "/api/stocks/swings?symbol=AAPL&timeframe=D&from=2025-01-01&to=2025-01-31&window=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let markers = body.as_array().unwrap();
        // high: 10 12 [15] 12 10 [9] 11 [14] 11 10
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0]["date"], "2025-01-08");
        assert_eq!(markers[0]["kind"], "peak");
        assert_eq!(markers[1]["date"], "2025-01-13");
        assert_eq!(markers[1]["kind"], "valley");
        assert_eq!(markers[2]["date"], "2025-01-15");
        assert_eq!(markers[2]["kind"], "peak");
    }

    #[tokio::test]
    async fn test_swings_invalid_window() {
        for window in ["0", "51", "-1", "abc"] {
            let uri = format!(
                "/api/stocks/swings?symbol=AAPL&timeframe=D&from=2025-01-01&to=2025-01-31&window={}",
                window
            );
            let (status, body) = call(app(MemoryPriceStore::new()), &uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code"], "INVALID_WINDOW");
        }
    }

    #[tokio::test]
    async fn test_missing_parameters_return_code() {
        let uris = [
            "/api/stocks/prices?symbol=AAPL&timeframe=D&to=2025-01-31",
            "/api/stocks/prices?timeframe=D&from=2025-01-01&to=2025-01-31",
            "/api/stocks/prices?symbol=AAPL&from=2025-01-01&to=2025-01-31",
            "/api/stocks/range?timeframe=D",
            "/api/stocks/range?symbol=AAPL",
            "/api/stocks/swings?symbol=AAPL&timeframe=D&from=2025-01-01",
        ];

        for uri in uris {
            let (status, body) = call(app(seeded_store().await), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["code"], "MISSING_PARAMETER", "{}", uri);
            assert!(body["message"].as_str().is_some(), "{}", uri);
        }
    }

    #[test]
    fn test_keep_most_recent() {
        let rows: Vec<PriceRow> = (1..=5)
            .map(|d| daily("AAPL", date(2025, 1, d), dec!(2), dec!(1)))
            .collect();

        let kept = keep_most_recent(rows.clone(), 3);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].date, date(2025, 1, 3));

        assert_eq!(keep_most_recent(rows, 10).len(), 5);
    }
}
