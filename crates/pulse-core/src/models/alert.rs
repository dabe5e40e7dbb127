//! 시스템 경고 / 권장 조치 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 경고 유형
///
/// 유형당 미해결 경고는 최대 1개만 존재한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// 저장공간 부족
    LowStorage,
    /// 메모리 과다 사용
    HighMemory,
    /// CPU 과부하
    HighCpu,
    /// 배터리 부족
    LowBattery,
    /// 배터리 수명 저하
    PoorBatteryHealth,
    /// 네트워크 저속
    SlowNetwork,
    /// 보안 업데이트 대기
    SecurityUpdate,
    /// 셀룰러 데이터 한도 임박
    CellularLimit,
}

impl AlertKind {
    /// 내보내기/로그용 식별자
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowStorage => "low_storage",
            Self::HighMemory => "high_memory",
            Self::HighCpu => "high_cpu",
            Self::LowBattery => "low_battery",
            Self::PoorBatteryHealth => "poor_battery_health",
            Self::SlowNetwork => "slow_network",
            Self::SecurityUpdate => "security_update",
            Self::CellularLimit => "cellular_limit",
        }
    }
}

/// 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// 시스템 경고
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    /// 발생 시각
    pub timestamp: DateTime<Utc>,
    /// 해결 표시 (다음 분석 패스에서 제거됨)
    pub resolved: bool,
}

impl Alert {
    /// 새 미해결 경고 생성
    pub fn new(
        kind: AlertKind,
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            severity,
            timestamp,
            resolved: false,
        }
    }
}

/// 권장 조치 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ClearCache,
    ReviewLargeFiles,
    OptimizeBattery,
    RunSpeedTest,
    CloseBackgroundApps,
    CheckPermissions,
    UpdateApps,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClearCache => "clear_cache",
            Self::ReviewLargeFiles => "review_large_files",
            Self::OptimizeBattery => "optimize_battery",
            Self::RunSpeedTest => "run_speed_test",
            Self::CloseBackgroundApps => "close_background_apps",
            Self::CheckPermissions => "check_permissions",
            Self::UpdateApps => "update_apps",
        }
    }
}

/// 조치 효과
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// 권장 조치
///
/// 분석 패스마다 목록 전체가 교체되므로 `id`는 패스 사이에 유지되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    /// 버튼 라벨
    pub action_label: String,
    pub impact: Impact,
    pub is_completed: bool,
}

impl Recommendation {
    pub fn new(
        kind: RecommendationKind,
        title: impl Into<String>,
        description: impl Into<String>,
        action_label: impl Into<String>,
        impact: Impact,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            description: description.into(),
            action_label: action_label.into(),
            impact,
            is_completed: false,
        }
    }
}
