//! 현지 날짜별 사용량 누계.
//!
//! 틱 증분을 현지 자정(UTC 저장) 단위 버킷에 앱별로 합산한다. 이력 버퍼와 달리
//! 개수로 밀려나지 않으므로 기간 한도 평가와 기간 초기화의 기준이 된다.

use chrono::{DateTime, Utc};
use pulse_core::models::period::Period;
use pulse_core::models::usage::AppUsage;
use std::collections::BTreeMap;

/// 날짜 버킷 (bundle id → 그날 누계)
type DayBucket = BTreeMap<String, AppUsage>;

/// 날짜별 사용량 누계
#[derive(Debug, Clone, Default)]
pub struct DailyLedger {
    /// 키: 해당 날짜 현지 자정
    days: BTreeMap<DateTime<Utc>, DayBucket>,
}

impl DailyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 앱 증분을 `day_start` 버킷에 합산 (0바이트는 무시)
    pub fn record(&mut self, day_start: DateTime<Utc>, delta: &AppUsage) {
        if delta.total_bytes() == 0 {
            return;
        }
        self.days
            .entry(day_start)
            .or_default()
            .entry(delta.bundle_id.clone())
            .or_insert_with(|| AppUsage::new(&delta.bundle_id, &delta.display_name))
            .merge(delta);
    }

    /// 기간 안에서 시작하는 버킷들의 (셀룰러, 와이파이) 합계
    pub fn totals(&self, window: &Period) -> (u64, u64) {
        self.buckets_within(window)
            .flat_map(|bucket| bucket.values())
            .fold((0u64, 0u64), |(c, w), app| {
                (
                    c.saturating_add(app.cellular_bytes),
                    w.saturating_add(app.wifi_bytes),
                )
            })
    }

    /// 기간 내 앱별 누계 (처음 등장 순)
    pub fn apps_within(&self, window: &Period) -> Vec<AppUsage> {
        crate::period::merge_apps(self.buckets_within(window).flat_map(|b| b.values()))
    }

    /// 기간 내 버킷 제거, 제거된 앱별 합계 반환
    pub fn remove_within(&mut self, window: &Period) -> Vec<AppUsage> {
        let keys: Vec<DateTime<Utc>> = self
            .days
            .keys()
            .filter(|day| window.contains(**day))
            .copied()
            .collect();
        let removed: Vec<DayBucket> = keys.iter().filter_map(|k| self.days.remove(k)).collect();
        crate::period::merge_apps(removed.iter().flat_map(|b| b.values()))
    }

    /// `cutoff` 이전 버킷 폐기, 폐기된 버킷 수 반환
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let kept = self.days.split_off(&cutoff);
        let dropped = self.days.len();
        self.days = kept;
        dropped
    }

    /// 추적 해제된 앱 제거
    pub fn forget_app(&mut self, bundle_id: &str) {
        for bucket in self.days.values_mut() {
            bucket.remove(bundle_id);
        }
        self.days.retain(|_, bucket| !bucket.is_empty());
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    fn buckets_within<'a>(&'a self, window: &'a Period) -> impl Iterator<Item = &'a DayBucket> {
        self.days
            .iter()
            .filter(move |(day, _)| window.contains(**day))
            .map(|(_, bucket)| bucket)
    }
}
