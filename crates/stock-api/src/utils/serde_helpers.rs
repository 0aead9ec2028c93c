//! 쿼리 파라미터용 serde 헬퍼.

use serde::{Deserialize, Deserializer};

/// 심볼 문자열을 정규화하여 역직렬화합니다.
///
/// 앞뒤 공백을 제거하고 대문자로 변환합니다. 필드가 없으면 `None`이며
/// `#[serde(default)]`와 함께 사용합니다.
pub fn deserialize_symbol<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_uppercase()))
}
