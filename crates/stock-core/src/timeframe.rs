//! 타임프레임 정의.
//!
//! 일봉(D), 주봉(W), 월봉(M) 세 가지만 지원합니다.
//! DB와 API에서는 한 글자 코드(`D`/`W`/`M`)로 표현합니다.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// 캔들 샘플링 단위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 일봉
    #[serde(rename = "D")]
    Daily,
    /// 주봉
    #[serde(rename = "W")]
    Weekly,
    /// 월봉
    #[serde(rename = "M")]
    Monthly,
}

impl Timeframe {
    /// 지원하는 모든 타임프레임.
    pub const ALL: [Timeframe; 3] = [Timeframe::Daily, Timeframe::Weekly, Timeframe::Monthly];

    /// DB/API 저장용 한 글자 코드.
    pub fn code(&self) -> &'static str {
        match self {
            Timeframe::Daily => "D",
            Timeframe::Weekly => "W",
            Timeframe::Monthly => "M",
        }
    }

    /// 일봉에서 파생되는 타임프레임인지 확인.
    pub fn is_derived(&self) -> bool {
        !matches!(self, Timeframe::Daily)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    /// 대소문자 구분 없이 `D`/`W`/`M`을 파싱합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "D" => Ok(Timeframe::Daily),
            "W" => Ok(Timeframe::Weekly),
            "M" => Ok(Timeframe::Monthly),
            _ => Err(CoreError::InvalidTimeframe(s.to_string())),
        }
    }
}
