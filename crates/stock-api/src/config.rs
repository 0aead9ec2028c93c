//! API 서버 설정.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};

/// 서버 설정 구조체.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
    /// 일봉 요청 최대 기간 (일)
    pub max_daily_span_days: i64,
    /// 요청 타임아웃 (초)
    pub request_timeout_seconds: u64,
    /// 허용 CORS origin 목록 (비어 있으면 모두 허용)
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드 (`.env` 파일이 있으면 먼저 읽음).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("DATABASE_URL 환경변수가 설정되지 않았습니다"))?;

        let max_daily_span_days: i64 = parse_or(&lookup, "API_MAX_DAILY_SPAN_DAYS", 3650)?;
        if max_daily_span_days <= 0 {
            return Err(anyhow!("API_MAX_DAILY_SPAN_DAYS는 양수여야 합니다"));
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host: lookup("API_HOST")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "API_PORT", 8080)?,
            max_daily_span_days,
            request_timeout_seconds: parse_or(&lookup, "API_REQUEST_TIMEOUT_SECONDS", 30)?,
            cors_origins,
        })
    }

    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} 값이 올바르지 않습니다: '{}'", key, raw)),
        _ => Ok(default),
    }
}
