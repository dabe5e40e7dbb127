//! 집계 기간 모델.
//!
//! 모든 기간은 반개구간 `[start, end)`이다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 기간 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Today,
    ThisWeek,
    ThisMonth,
    LastMonth,
    Custom,
}

/// 기간 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period_type: PeriodType,
}

impl Period {
    /// 사용자 지정 기간 (start < end 필수)
    pub fn custom(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CoreError> {
        if start >= end {
            return Err(CoreError::invalid(
                "period",
                format!("시작({start})이 종료({end})보다 앞서야 합니다"),
            ));
        }
        Ok(Self {
            start,
            end,
            period_type: PeriodType::Custom,
        })
    }

    /// 시각이 기간 안에 있는지 (start 포함, end 제외)
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}
