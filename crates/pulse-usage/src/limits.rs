//! 사용 한도 목록과 임계값 평가.
//!
//! 없는 id에 대한 수정/토글/삭제는 조용히 무시된다 (`false` 반환).

use chrono::{DateTime, Utc};
use pulse_core::error::CoreError;
use pulse_core::models::usage::{UsageAlert, UsageLimit};
use std::collections::VecDeque;
use tracing::{debug, info};
use uuid::Uuid;

/// 한도 목록 + 사용량 경고 보관함
#[derive(Debug, Clone)]
pub struct LimitBook {
    limits: Vec<UsageLimit>,
    alerts: VecDeque<UsageAlert>,
    max_alerts: usize,
}

impl LimitBook {
    /// 경고 보관 한도 지정 (0은 1로 취급)
    pub fn new(max_alerts: usize) -> Self {
        Self {
            limits: Vec::new(),
            alerts: VecDeque::new(),
            max_alerts: max_alerts.max(1),
        }
    }

    // ============================================================
    // 한도 CRUD
    // ============================================================

    /// 한도 추가 (검증 실패 시 `InvalidArgument`)
    pub fn add_limit(&mut self, limit: UsageLimit) -> Result<Uuid, CoreError> {
        limit.validate()?;
        let id = limit.id;
        info!(
            "사용 한도 추가: {} {}바이트",
            limit.limit_type.as_str(),
            limit.limit_value
        );
        self.limits.push(limit);
        Ok(id)
    }

    /// 같은 id의 한도 교체 (`created_at` 유지, `updated_at` 갱신)
    pub fn update_limit(&mut self, mut limit: UsageLimit) -> Result<bool, CoreError> {
        limit.validate()?;
        let Some(existing) = self.limits.iter_mut().find(|l| l.id == limit.id) else {
            debug!("수정할 한도 없음: {}", limit.id);
            return Ok(false);
        };
        limit.created_at = existing.created_at;
        limit.updated_at = Utc::now();
        *existing = limit;
        Ok(true)
    }

    pub fn delete_limit(&mut self, id: Uuid) -> bool {
        let before = self.limits.len();
        self.limits.retain(|l| l.id != id);
        self.limits.len() != before
    }

    /// 활성 상태 반전 + `updated_at` 갱신
    pub fn toggle_limit(&mut self, id: Uuid) -> bool {
        match self.limits.iter_mut().find(|l| l.id == id) {
            Some(limit) => {
                limit.is_enabled = !limit.is_enabled;
                limit.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn limits(&self) -> &[UsageLimit] {
        &self.limits
    }

    // ============================================================
    // 평가
    // ============================================================

    /// 활성 한도 전부 평가, 새로 생긴 경고 반환
    ///
    /// `usage_for`는 한도의 기간에 해당하는 (셀룰러, 와이파이) 사용량을 돌려준다.
    /// 같은 (한도 유형, 임계값 id)의 읽지 않은 경고가 있으면 건너뛴다.
    /// 읽은 경고는 재발생을 막지 않는다.
    pub fn evaluate<F>(&mut self, now: DateTime<Utc>, mut usage_for: F) -> Vec<UsageAlert>
    where
        F: FnMut(&UsageLimit) -> (u64, u64),
    {
        let mut raised = Vec::new();

        for limit in self.limits.iter().filter(|l| l.is_enabled) {
            let (cellular, wifi) = usage_for(limit);
            let current_usage = limit.limit_type.select(cellular, wifi);
            let percentage = limit.usage_percentage(current_usage);

            for threshold in limit.thresholds.iter().filter(|t| t.is_enabled) {
                if percentage < threshold.percentage {
                    continue;
                }
                let pending = self.alerts.iter().chain(raised.iter()).any(|a| {
                    !a.is_read && a.limit_type == limit.limit_type && a.threshold.id == threshold.id
                });
                if pending {
                    continue;
                }
                debug!(
                    "사용량 임계값 도달: {} {:.1}% >= {:.1}%",
                    limit.limit_type.as_str(),
                    percentage,
                    threshold.percentage
                );
                raised.push(UsageAlert {
                    id: Uuid::new_v4(),
                    limit_type: limit.limit_type,
                    current_usage,
                    limit_value: limit.limit_value,
                    threshold: threshold.clone(),
                    timestamp: now,
                    is_read: false,
                });
            }
        }

        self.alerts.extend(raised.iter().cloned());
        while self.alerts.len() > self.max_alerts {
            self.alerts.pop_front();
        }
        raised
    }

    // ============================================================
    // 경고 관리
    // ============================================================

    /// 오래된 순 경고 목록
    pub fn alerts(&self) -> Vec<UsageAlert> {
        self.alerts.iter().cloned().collect()
    }

    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.is_read = true;
                true
            }
            None => false,
        }
    }

    /// 전부 읽음 처리, 새로 읽음 처리된 개수 반환
    pub fn mark_all_read(&mut self) -> usize {
        let mut count = 0;
        for alert in self.alerts.iter_mut().filter(|a| !a.is_read) {
            alert.is_read = true;
            count += 1;
        }
        count
    }

    pub fn clear_alerts(&mut self) {
        self.alerts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::models::period::PeriodType;
    use pulse_core::models::usage::{AlertThreshold, LimitType, ThresholdLevel};

    const GB: u64 = 1_000_000_000;

    fn cellular_limit(thresholds: Vec<AlertThreshold>) -> UsageLimit {
        UsageLimit::new(LimitType::Cellular, 5 * GB, PeriodType::ThisMonth, thresholds).unwrap()
    }

    #[test]
    fn unread_alert_blocks_refire_read_does_not() {
        let warning = AlertThreshold::new(75.0, ThresholdLevel::Warning).unwrap();
        let mut book = LimitBook::new(50);
        book.add_limit(cellular_limit(vec![warning])).unwrap();

        let now = Utc::now();
        assert_eq!(book.evaluate(now, |_| (4 * GB, 0)).len(), 1);
        assert_eq!(book.evaluate(now, |_| (4 * GB, 0)).len(), 0);
        assert_eq!(book.alerts().len(), 1);

        assert_eq!(book.mark_all_read(), 1);
        let third = book.evaluate(now, |_| (4 * GB, 0));
        assert_eq!(third.len(), 1);
        assert_eq!(book.alerts().len(), 2);
        assert_eq!(book.alerts().iter().filter(|a| !a.is_read).count(), 1);
    }

    #[test]
    fn cellular_warning_then_critical() {
        let warning = AlertThreshold::new(75.0, ThresholdLevel::Warning).unwrap();
        let critical = AlertThreshold::new(90.0, ThresholdLevel::Critical).unwrap();
        let mut book = LimitBook::new(50);
        book.add_limit(cellular_limit(vec![warning, critical]))
            .unwrap();

        let first = book.evaluate(Utc::now(), |_| (3_900_000_000, 0));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].threshold.level, ThresholdLevel::Warning);
        assert_eq!(first[0].usage_percentage(), 78.0);

        let second = book.evaluate(Utc::now(), |_| (4_600_000_000, 0));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].threshold.level, ThresholdLevel::Critical);

        let all = book.alerts();
        assert_eq!(all.len(), 2);
        assert_ne!(all[0].id, all[1].id);
        assert_eq!(all[0].threshold.level, ThresholdLevel::Warning);
    }

    #[test]
    fn limit_type_selects_counter() {
        let t = AlertThreshold::new(50.0, ThresholdLevel::Warning).unwrap();
        let mut book = LimitBook::new(50);
        book.add_limit(
            UsageLimit::new(LimitType::Wifi, 10 * GB, PeriodType::Today, vec![t.clone()]).unwrap(),
        )
        .unwrap();
        book.add_limit(
            UsageLimit::new(LimitType::Total, 10 * GB, PeriodType::Today, vec![t]).unwrap(),
        )
        .unwrap();

        // 셀룰러 4GB + 와이파이 2GB → Total만 50% 초과
        let raised = book.evaluate(Utc::now(), |_| (4 * GB, 2 * GB));
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].limit_type, LimitType::Total);
        assert_eq!(raised[0].current_usage, 6 * GB);
    }

    #[test]
    fn usage_is_looked_up_per_limit_period() {
        let t = AlertThreshold::new(50.0, ThresholdLevel::Warning).unwrap();
        let mut book = LimitBook::new(50);
        book.add_limit(
            UsageLimit::new(LimitType::Cellular, 10 * GB, PeriodType::Today, vec![t.clone()])
                .unwrap(),
        )
        .unwrap();
        book.add_limit(cellular_limit(vec![t])).unwrap();

        // 오늘 1GB, 이번 달 3GB
        let raised = book.evaluate(Utc::now(), |limit| match limit.period_type {
            PeriodType::Today => (GB, 0),
            _ => (3 * GB, 0),
        });
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].current_usage, 3 * GB);
        assert_eq!(raised[0].limit_value, 5 * GB);
    }

    #[test]
    fn disabled_limits_and_thresholds_are_skipped() {
        let mut off = AlertThreshold::new(10.0, ThresholdLevel::Warning).unwrap();
        off.is_enabled = false;
        let on = AlertThreshold::new(20.0, ThresholdLevel::Critical).unwrap();
        let mut book = LimitBook::new(50);
        let id = book.add_limit(cellular_limit(vec![off, on])).unwrap();

        assert!(book.toggle_limit(id));
        assert!(book.evaluate(Utc::now(), |_| (5 * GB, 0)).is_empty());

        assert!(book.toggle_limit(id));
        let raised = book.evaluate(Utc::now(), |_| (5 * GB, 0));
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].threshold.level, ThresholdLevel::Critical);
    }

    #[test]
    fn alert_cap_drops_oldest() {
        let mut book = LimitBook::new(3);
        let t = AlertThreshold::new(1.0, ThresholdLevel::Warning).unwrap();
        book.add_limit(cellular_limit(vec![t])).unwrap();

        let mut ids = Vec::new();
        for _ in 0..5 {
            let raised = book.evaluate(Utc::now(), |_| (GB, 0));
            ids.push(raised[0].id);
            book.mark_all_read();
        }
        let kept: Vec<_> = book.alerts().iter().map(|a| a.id).collect();
        assert_eq!(kept, ids[2..].to_vec());
    }

    #[test]
    fn crud_unknown_ids_noop() {
        let mut book = LimitBook::new(50);
        let limit = cellular_limit(vec![]);
        assert!(!book.update_limit(limit.clone()).unwrap());
        assert!(!book.delete_limit(limit.id));
        assert!(!book.toggle_limit(limit.id));
        assert!(!book.mark_read(Uuid::new_v4()));
    }

    #[test]
    fn update_keeps_created_at() {
        let mut book = LimitBook::new(50);
        let limit = cellular_limit(vec![]);
        let id = book.add_limit(limit.clone()).unwrap();

        let mut changed = limit.clone();
        changed.limit_value = 8 * GB;
        changed.created_at = Utc::now() + chrono::Duration::days(1);
        assert!(book.update_limit(changed).unwrap());

        let stored = &book.limits()[0];
        assert_eq!(stored.id, id);
        assert_eq!(stored.limit_value, 8 * GB);
        assert_eq!(stored.created_at, limit.created_at);

        let mut invalid = stored.clone();
        invalid.limit_value = 0;
        assert!(book.update_limit(invalid).is_err());

        assert!(book.delete_limit(id));
        assert!(book.limits().is_empty());
    }
}
