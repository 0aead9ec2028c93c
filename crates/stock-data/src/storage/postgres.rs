//! PostgreSQL 가격 저장소.
//!
//! `stock_prices` 테이블의 `(symbol, timeframe, price_date)` 기본키로
//! `ON CONFLICT DO UPDATE` upsert를 수행합니다.
//!
//! 주봉/월봉 집계는 `date_trunc` GROUP BY 쿼리로 푸시다운하며,
//! 결과는 `stock_core::aggregate`와 동일합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPool, FromRow};
use stock_core::{DateRange, PriceRow, Timeframe};
use tracing::{debug, info, instrument};

use super::{dedupe_batch, PriceStore};
use crate::error::{DataError, Result};

/// 스키마 정의 (멱등).
const SCHEMA_SQL: &str = include_str!("../../migrations/001_stock_prices.sql");

/// UNNEST 배치 크기.
const UPSERT_CHUNK_SIZE: usize = 500;

/// `stock_prices` 레코드.
#[derive(Debug, Clone, FromRow)]
struct PriceRecord {
    symbol: String,
    timeframe: String,
    price_date: NaiveDate,
    open_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    close_price: Decimal,
    volume: i64,
}

impl TryFrom<PriceRecord> for PriceRow {
    type Error = DataError;

    fn try_from(r: PriceRecord) -> Result<Self> {
        let timeframe = r
            .timeframe
            .parse::<Timeframe>()
            .map_err(|e| DataError::InvalidRecord(e.to_string()))?;

        Ok(PriceRow {
            symbol: r.symbol,
            timeframe,
            date: r.price_date,
            open: r.open_price,
            high: r.high_price,
            low: r.low_price,
            close: r.close_price,
            volume: r.volume,
        })
    }
}

/// 집계 쿼리 결과 레코드.
#[derive(Debug, Clone, FromRow)]
struct BucketRecord {
    symbol: String,
    bucket_start: NaiveDate,
    open_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    close_price: Decimal,
    volume: i64,
}

/// PostgreSQL 가격 저장소.
#[derive(Clone)]
pub struct PgPriceStore {
    pool: PgPool,
}

impl PgPriceStore {
    /// 새 저장소 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 테이블/인덱스 생성 (이미 있으면 무시).
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::QueryError(e.to_string()))?;
        info!("stock_prices 스키마 확인 완료");
        Ok(())
    }
}

/// 집계 타임프레임의 `date_trunc` 단위.
///
/// PostgreSQL의 `week`는 ISO 주(월요일 시작)입니다.
fn trunc_unit(timeframe: Timeframe) -> Option<&'static str> {
    match timeframe {
        Timeframe::Daily => None,
        Timeframe::Weekly => Some("week"),
        Timeframe::Monthly => Some("month"),
    }
}

#[async_trait]
impl PriceStore for PgPriceStore {
    async fn max_date(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<NaiveDate>> {
        sqlx::query_scalar::<_, Option<NaiveDate>>(
            r#"
            SELECT MAX(price_date)
            FROM stock_prices
            WHERE symbol = $1 AND timeframe = $2
            "#,
        )
        .bind(symbol)
        .bind(timeframe.code())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn upsert(&self, rows: &[PriceRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        for row in rows {
            row.validate()?;
        }

        // 같은 INSERT 안에서 동일 키를 두 번 갱신할 수 없으므로 중복 제거
        let batch = dedupe_batch(rows);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

        for chunk in batch.chunks(UPSERT_CHUNK_SIZE) {
            let symbols: Vec<&str> = chunk.iter().map(|r| r.symbol.as_str()).collect();
            let timeframes: Vec<&str> = chunk.iter().map(|r| r.timeframe.code()).collect();
            let dates: Vec<NaiveDate> = chunk.iter().map(|r| r.date).collect();
            let opens: Vec<Decimal> = chunk.iter().map(|r| r.open).collect();
            let highs: Vec<Decimal> = chunk.iter().map(|r| r.high).collect();
            let lows: Vec<Decimal> = chunk.iter().map(|r| r.low).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|r| r.close).collect();
            let volumes: Vec<i64> = chunk.iter().map(|r| r.volume).collect();

            // 값이 같으면 UPDATE를 건너뛰어 재실행 시 updated_at도 그대로 유지
            sqlx::query(
                r#"
                INSERT INTO stock_prices
                    (symbol, timeframe, price_date, open_price, high_price, low_price, close_price, volume)
                SELECT * FROM UNNEST(
                    $1::text[], $2::text[], $3::date[],
                    $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[], $8::bigint[]
                )
                ON CONFLICT (symbol, timeframe, price_date) DO UPDATE SET
                    open_price = EXCLUDED.open_price,
                    high_price = EXCLUDED.high_price,
                    low_price = EXCLUDED.low_price,
                    close_price = EXCLUDED.close_price,
                    volume = EXCLUDED.volume,
                    updated_at = NOW()
                WHERE (stock_prices.open_price, stock_prices.high_price, stock_prices.low_price,
                       stock_prices.close_price, stock_prices.volume)
                    IS DISTINCT FROM
                      (EXCLUDED.open_price, EXCLUDED.high_price, EXCLUDED.low_price,
                       EXCLUDED.close_price, EXCLUDED.volume)
                "#,
            )
            .bind(&symbols)
            .bind(&timeframes)
            .bind(&dates)
            .bind(&opens)
            .bind(&highs)
            .bind(&lows)
            .bind(&closes)
            .bind(&volumes)
            .execute(&mut *tx)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

        debug!(rows = batch.len(), "가격 배치 upsert 커밋");
        Ok(batch.len())
    }

    async fn range(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<DateRange>> {
        let (min_date, max_date, row_count): (Option<NaiveDate>, Option<NaiveDate>, i64) =
            sqlx::query_as(
                r#"
                SELECT MIN(price_date), MAX(price_date), COUNT(*)
                FROM stock_prices
                WHERE symbol = $1 AND timeframe = $2
                "#,
            )
            .bind(symbol)
            .bind(timeframe.code())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DataError::QueryError(e.to_string()))?;

        Ok(match (min_date, max_date) {
            (Some(min_date), Some(max_date)) if row_count > 0 => Some(DateRange {
                symbol: symbol.to_string(),
                timeframe,
                min_date,
                max_date,
                row_count,
            }),
            _ => None,
        })
    }

    async fn symbols(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT symbol
            FROM stock_prices
            ORDER BY symbol
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))
    }

    async fn prices(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRow>> {
        let records: Vec<PriceRecord> = sqlx::query_as(
            r#"
            SELECT symbol, timeframe, price_date, open_price, high_price, low_price, close_price, volume
            FROM stock_prices
            WHERE symbol = $1
              AND timeframe = $2
              AND price_date >= $3
              AND price_date <= $4
            ORDER BY price_date ASC
            "#,
        )
        .bind(symbol)
        .bind(timeframe.code())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))?;

        records.into_iter().map(PriceRow::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn aggregated_prices(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRow>> {
        let Some(unit) = trunc_unit(timeframe) else {
            return self.prices(symbol, timeframe, from, to).await;
        };

        let records: Vec<BucketRecord> = sqlx::query_as(
            r#"
            SELECT
                symbol,
                date_trunc($2, price_date::timestamp)::date AS bucket_start,
                (array_agg(open_price ORDER BY price_date ASC))[1] AS open_price,
                MAX(high_price) AS high_price,
                MIN(low_price) AS low_price,
                (array_agg(close_price ORDER BY price_date DESC))[1] AS close_price,
                SUM(volume)::bigint AS volume
            FROM stock_prices
            WHERE symbol = $1
              AND timeframe = 'D'
              AND price_date >= $3
              AND price_date <= $4
            GROUP BY symbol, bucket_start
            ORDER BY bucket_start ASC
            "#,
        )
        .bind(symbol)
        .bind(unit)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))?;

        debug!(buckets = records.len(), "집계 쿼리 완료");

        Ok(records
            .into_iter()
            .map(|r| PriceRow {
                symbol: r.symbol,
                timeframe,
                date: r.bucket_start,
                open: r.open_price,
                high: r.high_price,
                low: r.low_price,
                close: r.close_price,
                volume: r.volume,
            })
            .collect())
    }

    async fn aggregated_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Option<DateRange>> {
        let Some(unit) = trunc_unit(timeframe) else {
            return self.range(symbol, timeframe).await;
        };

        let (min_date, max_date, row_count): (Option<NaiveDate>, Option<NaiveDate>, i64) =
            sqlx::query_as(
                r#"
                SELECT MIN(bucket_start), MAX(bucket_start), COUNT(DISTINCT bucket_start)
                FROM (
                    SELECT date_trunc($2, price_date::timestamp)::date AS bucket_start
                    FROM stock_prices
                    WHERE symbol = $1 AND timeframe = 'D'
                ) buckets
                "#,
            )
            .bind(symbol)
            .bind(unit)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DataError::QueryError(e.to_string()))?;

        Ok(match (min_date, max_date) {
            (Some(min_date), Some(max_date)) if row_count > 0 => Some(DateRange {
                symbol: symbol.to_string(),
                timeframe,
                min_date,
                max_date,
                row_count,
            }),
            _ => None,
        })
    }
}
