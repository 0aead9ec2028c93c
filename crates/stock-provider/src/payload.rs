//! Alpha Vantage 응답 형태 분류.
//!
//! Alpha Vantage는 rate limit과 요청 오류를 HTTP 200 본문에 담아 보냅니다.
//! 응답은 클라이언트 경계에서 한 번만 [`ProviderPayload`]로 분류합니다.

use serde_json::Value;
use stock_core::Timeframe;

/// Rate limit 안내 키.
const NOTE_KEY: &str = "Note";
/// 호출 한도/프리미엄 안내 키.
const INFORMATION_KEY: &str = "Information";
/// 잘못된 심볼/함수 키.
const ERROR_MESSAGE_KEY: &str = "Error Message";

/// 응답 본문 분류 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderPayload {
    /// 시계열 데이터 (정규화 단계로 전달)
    Series,
    /// Rate limit 안내 (재시도 대상)
    RateLimited(String),
    /// 요청 거부 (재시도 불가)
    Rejected(String),
}

impl ProviderPayload {
    /// 응답 본문을 분류합니다.
    ///
    /// JSON이 아닌 본문은 `Series`로 분류하고 정규화 단계에서 에러로 처리합니다.
    pub fn classify(body: &str) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
            return ProviderPayload::Series;
        };

        if let Some(msg) = map.get(ERROR_MESSAGE_KEY) {
            return ProviderPayload::Rejected(message_text(msg));
        }

        for key in [NOTE_KEY, INFORMATION_KEY] {
            if let Some(msg) = map.get(key) {
                return ProviderPayload::RateLimited(message_text(msg));
            }
        }

        ProviderPayload::Series
    }
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 타임프레임별 API function 이름.
pub fn function_name(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::Daily => "TIME_SERIES_DAILY",
        Timeframe::Weekly => "TIME_SERIES_WEEKLY",
        Timeframe::Monthly => "TIME_SERIES_MONTHLY",
    }
}

/// 타임프레임별 시계열 섹션 키.
pub fn series_key(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::Daily => "Time Series (Daily)",
        Timeframe::Weekly => "Weekly Time Series",
        Timeframe::Monthly => "Monthly Time Series",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_series() {
        let body = r#"{"Meta Data": {}, "Time Series (Daily)": {}}"#;
        assert_eq!(ProviderPayload::classify(body), ProviderPayload::Series);
    }

    #[test]
    fn test_classify_rate_limit_markers() {
        let note = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        assert!(matches!(
            ProviderPayload::classify(note),
            ProviderPayload::RateLimited(msg) if msg.contains("call frequency")
        ));

        let info = r#"{"Information": "We have detected your API key"}"#;
        assert!(matches!(
            ProviderPayload::classify(info),
            ProviderPayload::RateLimited(_)
        ));
    }

    #[test]
    fn test_classify_hard_error() {
        let body = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        assert!(matches!(
            ProviderPayload::classify(body),
            ProviderPayload::Rejected(msg) if msg.starts_with("Invalid API call")
        ));
    }

    #[test]
    fn test_classify_non_json_defers_to_normalizer() {
        assert_eq!(ProviderPayload::classify("<html>"), ProviderPayload::Series);
    }

    #[test]
    fn test_endpoint_mapping() {
        assert_eq!(function_name(Timeframe::Daily), "TIME_SERIES_DAILY");
        assert_eq!(series_key(Timeframe::Weekly), "Weekly Time Series");
        assert_eq!(series_key(Timeframe::Monthly), "Monthly Time Series");
    }
}
