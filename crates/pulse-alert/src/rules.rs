//! 경고 규칙.
//!
//! 각 규칙은 스냅샷에 대한 순수 조건식이며 후보 경고를 0개 또는 1개 만든다.
//! 중복 억제는 엔진이 담당한다.

use chrono::{DateTime, Utc};
use pulse_core::models::alert::{Alert, AlertKind, Severity};
use pulse_core::models::health::{BatteryHealth, HealthSnapshot};
use pulse_core::models::usage::{ThresholdLevel, UsageAlert};
use pulse_core::ports::update::SecurityUpdate;

/// 스냅샷 규칙 시그니처
pub type SnapshotRule = fn(&HealthSnapshot) -> Option<Alert>;

/// 스냅샷 규칙 목록 (평가 순서)
pub const SNAPSHOT_RULES: &[SnapshotRule] = &[
    low_storage,
    high_memory,
    high_cpu,
    low_battery,
    poor_battery_health,
    slow_network,
];

const GB: f64 = 1_000_000_000.0;

/// 모든 스냅샷 규칙 평가
pub fn evaluate(snapshot: &HealthSnapshot) -> Vec<Alert> {
    SNAPSHOT_RULES
        .iter()
        .filter_map(|rule| rule(snapshot))
        .collect()
}

pub fn low_storage(s: &HealthSnapshot) -> Option<Alert> {
    s.storage.is_low.then(|| {
        Alert::new(
            AlertKind::LowStorage,
            "저장공간 부족",
            format!(
                "사용 가능한 공간이 {:.1}GB 남았습니다 ({:.0}% 사용 중)",
                s.storage.available as f64 / GB,
                s.storage.usage_percent()
            ),
            Severity::High,
            s.timestamp,
        )
    })
}

pub fn high_memory(s: &HealthSnapshot) -> Option<Alert> {
    s.memory.is_high.then(|| {
        Alert::new(
            AlertKind::HighMemory,
            "메모리 사용량 높음",
            format!("메모리 사용률 {:.0}%", s.memory.usage_percent()),
            Severity::Medium,
            s.timestamp,
        )
    })
}

pub fn high_cpu(s: &HealthSnapshot) -> Option<Alert> {
    s.cpu.is_high.then(|| {
        Alert::new(
            AlertKind::HighCpu,
            "CPU 과부하",
            format!("CPU 사용률 {:.0}%", s.cpu.usage_percent),
            Severity::Medium,
            s.timestamp,
        )
    })
}

/// 충전 중이면 발생하지 않는다
pub fn low_battery(s: &HealthSnapshot) -> Option<Alert> {
    (s.battery.is_low && !s.battery.is_charging).then(|| {
        let severity = if s.battery.level < 0.10 {
            Severity::Critical
        } else {
            Severity::High
        };
        Alert::new(
            AlertKind::LowBattery,
            "배터리 부족",
            format!("배터리 잔량 {:.0}%, 충전기를 연결하세요", s.battery.level * 100.0),
            severity,
            s.timestamp,
        )
    })
}

pub fn poor_battery_health(s: &HealthSnapshot) -> Option<Alert> {
    (s.battery.health == BatteryHealth::Poor).then(|| {
        let message = match s.battery.cycle_count {
            Some(cycles) => format!("충전 사이클 {cycles}회, 배터리 교체를 고려하세요"),
            None => "배터리 교체를 고려하세요".to_string(),
        };
        Alert::new(
            AlertKind::PoorBatteryHealth,
            "배터리 수명 저하",
            message,
            Severity::Medium,
            s.timestamp,
        )
    })
}

/// 연결되어 있을 때만 발생
pub fn slow_network(s: &HealthSnapshot) -> Option<Alert> {
    (s.network.is_connected && s.network.is_slow).then(|| {
        Alert::new(
            AlertKind::SlowNetwork,
            "네트워크 속도 저하",
            format!(
                "다운로드 {:.1}Mbps / 업로드 {:.1}Mbps",
                s.network.download_mbps, s.network.upload_mbps
            ),
            Severity::Low,
            s.timestamp,
        )
    })
}

pub fn security_update(update: &SecurityUpdate, at: DateTime<Utc>) -> Alert {
    Alert::new(
        AlertKind::SecurityUpdate,
        "보안 업데이트 대기",
        format!("{}: {}", update.version, update.summary),
        Severity::High,
        at,
    )
}

/// 셀룰러 사용량 경고 → 시스템 경고 (셀룰러가 아니면 None)
pub fn cellular_limit(usage: &UsageAlert) -> Option<Alert> {
    if usage.limit_type != pulse_core::models::usage::LimitType::Cellular {
        return None;
    }
    let severity = match usage.threshold.level {
        ThresholdLevel::Warning => Severity::Medium,
        ThresholdLevel::Critical => Severity::Critical,
    };
    Some(Alert::new(
        AlertKind::CellularLimit,
        "셀룰러 데이터 한도 임박",
        format!(
            "한도의 {:.0}% 사용 ({:.2}GB / {:.2}GB)",
            usage.usage_percentage(),
            usage.current_usage as f64 / GB,
            usage.limit_value as f64 / GB
        ),
        severity,
        usage.timestamp,
    ))
}
