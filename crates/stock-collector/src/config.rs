//! 환경변수 기반 설정 모듈.

use std::{str::FromStr, time::Duration};

use secrecy::{ExposeSecret, SecretString};
use stock_core::Timeframe;
use stock_provider::{AlphaVantageConfig, RetryConfig, DEFAULT_BASE_URL};

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 데이터 프로바이더 설정
    pub provider: ProviderConfig,
    /// 가격 수집 설정
    pub price_sync: PriceSyncConfig,
}

/// Alpha Vantage 설정
#[derive(Debug)]
pub struct ProviderConfig {
    /// API 키
    pub api_key: SecretString,
    /// API 엔드포인트
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub http_timeout_seconds: u64,
    /// 재시도 횟수 (초기 시도 제외)
    pub retry_count: u32,
}

/// 가격 수집 설정
#[derive(Debug, Clone)]
pub struct PriceSyncConfig {
    /// 대상 심볼 (대문자, 중복 제거)
    pub symbols: Vec<String>,
    /// 대상 타임프레임 (중복 제거)
    pub timeframes: Vec<Timeframe>,
    /// 일봉 보존 기간 (일, 0이면 제한 없음)
    pub max_days_back: u32,
    /// 수집 단위 사이 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (`.env` 파일이 있으면 먼저 읽음)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, "ALPHAVANTAGE_API_KEY")?;
        let database_url = required(&lookup, "DATABASE_URL")?;
        let symbols = parse_symbol_list(&required(&lookup, "STOCK_SYMBOLS")?)?;
        let timeframes = parse_timeframe_list(&required(&lookup, "TIMEFRAMES")?)?;

        Ok(Self {
            database_url,
            provider: ProviderConfig {
                api_key: SecretString::from(api_key),
                base_url: lookup("ALPHAVANTAGE_BASE_URL")
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                http_timeout_seconds: env_var_parse(&lookup, "HTTP_TIMEOUT_SECONDS", 20)?,
                retry_count: env_var_parse(&lookup, "RETRY_COUNT", 3)?,
            },
            price_sync: PriceSyncConfig {
                symbols,
                timeframes,
                max_days_back: env_var_parse(&lookup, "MAX_DAYS_BACK", 3650)?,
                request_delay_ms: env_var_parse(&lookup, "REQUEST_DELAY_MS", 0)?,
            },
        })
    }

    /// 프로바이더 클라이언트 설정으로 변환.
    pub fn alpha_vantage_config(&self) -> AlphaVantageConfig {
        AlphaVantageConfig {
            api_key: SecretString::from(self.provider.api_key.expose_secret().to_string()),
            base_url: self.provider.base_url.clone(),
            timeout: Duration::from_secs(self.provider.http_timeout_seconds),
            retry: RetryConfig::with_max_retries(self.provider.retry_count),
        }
    }
}

impl PriceSyncConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// `DATABASE_URL`만 필요한 명령(migrate, range)용.
pub fn database_url_from_env() -> Result<String> {
    dotenvy::dotenv().ok();
    required(&|key: &str| std::env::var(key).ok(), "DATABASE_URL")
}

/// 필수 값 조회 (빈 문자열은 없는 것으로 처리)
fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CollectorError::Config(format!("{} 환경변수가 설정되지 않았습니다", key)))
}

/// 숫자 값 파싱 (없으면 기본값, 형식 오류는 설정 에러)
fn env_var_parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            CollectorError::Config(format!("{} 값이 올바르지 않습니다: '{}'", key, raw))
        }),
        _ => Ok(default),
    }
}

/// 쉼표 구분 심볼 목록 파싱 (대문자 변환, 순서 유지 중복 제거)
pub fn parse_symbol_list(raw: &str) -> Result<Vec<String>> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }

    if symbols.is_empty() {
        return Err(CollectorError::Config("심볼 목록이 비어 있습니다".to_string()));
    }
    Ok(symbols)
}

/// 쉼표 구분 타임프레임 목록 파싱 (D/W/M, 대소문자 무시)
pub fn parse_timeframe_list(raw: &str) -> Result<Vec<Timeframe>> {
    let mut timeframes: Vec<Timeframe> = Vec::new();
    for code in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let timeframe = code
            .parse::<Timeframe>()
            .map_err(|e| CollectorError::Config(e.to_string()))?;
        if !timeframes.contains(&timeframe) {
            timeframes.push(timeframe);
        }
    }

    if timeframes.is_empty() {
        return Err(CollectorError::Config(
            "타임프레임 목록이 비어 있습니다".to_string(),
        ));
    }
    Ok(timeframes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ALPHAVANTAGE_API_KEY", "demo"),
            ("DATABASE_URL", "postgres://stock:pw@localhost/stocks"),
            ("STOCK_SYMBOLS", " aapl, MSFT ,aapl,,ibm"),
            ("TIMEFRAMES", "d,W,D"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = CollectorConfig::from_lookup(lookup_from(&base_vars())).unwrap();

        assert_eq!(config.price_sync.symbols, vec!["AAPL", "MSFT", "IBM"]);
        assert_eq!(
            config.price_sync.timeframes,
            vec![Timeframe::Daily, Timeframe::Weekly]
        );
        assert_eq!(config.price_sync.max_days_back, 3650);
        assert_eq!(config.price_sync.request_delay_ms, 0);
        assert_eq!(config.provider.http_timeout_seconds, 20);
        assert_eq!(config.provider.retry_count, 3);
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider.api_key.expose_secret(), "demo");
    }

    #[test]
    fn test_overrides_parsed() {
        let mut vars = base_vars();
        vars.push(("MAX_DAYS_BACK", "30"));
        vars.push(("RETRY_COUNT", "0"));
        vars.push(("REQUEST_DELAY_MS", "12000"));
        vars.push(("HTTP_TIMEOUT_SECONDS", "5"));

        let config = CollectorConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.price_sync.max_days_back, 30);
        assert_eq!(config.provider.retry_count, 0);
        assert_eq!(config.price_sync.request_delay(), Duration::from_secs(12));

        let av = config.alpha_vantage_config();
        assert_eq!(av.timeout, Duration::from_secs(5));
        assert_eq!(av.retry.max_retries, 0);
    }

    #[test]
    fn test_missing_required_is_config_error() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(k, _)| *k != "ALPHAVANTAGE_API_KEY")
            .collect();

        let err = CollectorConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, CollectorError::Config(msg) if msg.contains("ALPHAVANTAGE_API_KEY")));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let mut vars = base_vars();
        vars.push(("RETRY_COUNT", "three"));

        assert!(matches!(
            CollectorConfig::from_lookup(lookup_from(&vars)),
            Err(CollectorError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_timeframe_rejected() {
        assert!(parse_timeframe_list("D,H").is_err());
        assert!(parse_timeframe_list(" , ").is_err());
    }

    #[test]
    fn test_empty_symbol_list_rejected() {
        assert!(parse_symbol_list(" ,, ").is_err());
    }
}
