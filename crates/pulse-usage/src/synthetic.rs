//! 결정적 모의 사용량 생성기.
//!
//! 실제 OS 사용량 API 대신 경과 시간 × 앱별 배수로 증분을 만든다.
//! 한 증분은 셀룰러 또는 와이파이 한쪽에만 귀속된다.

use pulse_core::models::usage::{AppUsage, NetworkKind, UsageDelta};
use pulse_core::ports::usage_source::UsageDeltaSource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// 기본 앱 목록 (bundle id, 표시 이름, 배수)
const DEMO_APPS: &[(&str, &str, f64)] = &[
    ("com.google.ios.youtube", "YouTube", 4.0),
    ("com.spotify.client", "Spotify", 1.5),
    ("com.burbn.instagram", "Instagram", 2.5),
    ("com.apple.mobilesafari", "Safari", 1.0),
    ("com.apple.Maps", "Maps", 0.5),
];

/// 모의 사용량 생성기
#[derive(Debug)]
pub struct SyntheticUsageSource {
    /// 배수 1.0 기준 초당 바이트
    base_bytes_per_sec: u64,
    multipliers: HashMap<String, f64>,
    /// N번째 틱마다 셀룰러로 귀속
    cellular_every: u64,
    ticks: AtomicU64,
}

impl SyntheticUsageSource {
    pub fn new(base_bytes_per_sec: u64) -> Self {
        Self {
            base_bytes_per_sec,
            multipliers: HashMap::new(),
            cellular_every: 3,
            ticks: AtomicU64::new(0),
        }
    }

    /// 기본 앱 배수가 등록된 생성기
    pub fn with_demo_profile(base_bytes_per_sec: u64) -> Self {
        DEMO_APPS
            .iter()
            .fold(Self::new(base_bytes_per_sec), |source, (id, _, m)| {
                source.with_multiplier(*id, *m)
            })
    }

    pub fn with_multiplier(mut self, bundle_id: impl Into<String>, multiplier: f64) -> Self {
        self.multipliers.insert(bundle_id.into(), multiplier.max(0.0));
        self
    }

    /// 셀룰러 귀속 주기 (0은 1로 취급)
    pub fn with_cellular_every(mut self, every: u64) -> Self {
        self.cellular_every = every.max(1);
        self
    }

    fn multiplier(&self, bundle_id: &str) -> f64 {
        self.multipliers.get(bundle_id).copied().unwrap_or(1.0)
    }
}

impl Default for SyntheticUsageSource {
    fn default() -> Self {
        Self::with_demo_profile(16 * 1024)
    }
}

/// 기본 추적 앱 목록
pub fn demo_apps() -> Vec<AppUsage> {
    DEMO_APPS
        .iter()
        .map(|(id, name, _)| AppUsage::new(*id, *name))
        .collect()
}

impl UsageDeltaSource for SyntheticUsageSource {
    fn deltas(&self, apps: &[AppUsage], elapsed: Duration) -> Vec<UsageDelta> {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        let secs = elapsed.as_secs_f64();

        apps.iter()
            .enumerate()
            .filter_map(|(i, app)| {
                let rate = self.base_bytes_per_sec as f64 * self.multiplier(&app.bundle_id);
                let bytes = (secs * rate) as u64;
                if bytes == 0 {
                    return None;
                }
                let network = if (tick + i as u64) % self.cellular_every == 0 {
                    NetworkKind::Cellular
                } else {
                    NetworkKind::Wifi
                };
                Some(UsageDelta {
                    bundle_id: app.bundle_id.clone(),
                    network,
                    bytes,
                })
            })
            .collect()
    }
}
