//! 사용량 증분 공급 포트.
//!
//! 구현: `pulse-usage` crate (`SyntheticUsageSource`)

use std::time::Duration;

use crate::models::usage::{AppUsage, UsageDelta};

/// 틱 사이 앱별 바이트 증분 공급자
pub trait UsageDeltaSource: Send + Sync {
    /// `elapsed` 동안 추적 중인 앱들의 증분
    ///
    /// 증분 하나는 셀룰러 또는 Wi-Fi 중 한쪽에만 귀속된다.
    fn deltas(&self, apps: &[AppUsage], elapsed: Duration) -> Vec<UsageDelta>;
}
