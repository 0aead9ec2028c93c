//! 스윙 포인트(국소 고점/저점) 감지.
//!
//! 대칭 윈도우 N 안에서 high가 엄격히 가장 높으면 Peak,
//! low가 엄격히 가장 낮으면 Valley입니다. 동률은 자격을 박탈합니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::PriceRow;

/// 스윙 포인트 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    Peak,
    Valley,
}

/// 차트 주석용 스윙 마커. 저장하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwingMarker {
    pub date: NaiveDate,
    pub kind: SwingKind,
}

/// 날짜 오름차순 캔들에서 스윙 포인트를 찾습니다.
///
/// 양쪽에 최소 `window`개의 캔들이 있는 인덱스만 후보입니다.
/// 같은 캔들이 Peak와 Valley 둘 다 될 수 있으며, 이 경우 Peak가 먼저 나옵니다.
/// `window == 0`이면 빈 목록을 반환합니다.
pub fn detect_swings(candles: &[PriceRow], window: usize) -> Vec<SwingMarker> {
    // 2 * window + 1 이 usize를 넘으면 후보가 있을 수 없음
    let needed = window.checked_mul(2).and_then(|w| w.checked_add(1));
    if window == 0 || needed.map_or(true, |need| candles.len() < need) {
        return Vec::new();
    }

    let mut markers = Vec::new();

    for i in window..candles.len() - window {
        let center = &candles[i];
        let neighbours = (1..=window).flat_map(|k| [&candles[i - k], &candles[i + k]]);

        let mut is_peak = true;
        let mut is_valley = true;
        for other in neighbours {
            if center.high <= other.high {
                is_peak = false;
            }
            if center.low >= other.low {
                is_valley = false;
            }
            if !is_peak && !is_valley {
                break;
            }
        }

        if is_peak {
            markers.push(SwingMarker {
                date: center.date,
                kind: SwingKind::Peak,
            });
        }
        if is_valley {
            markers.push(SwingMarker {
                date: center.date,
                kind: SwingKind::Valley,
            });
        }
    }

    markers
}
