//! 헬스 스냅샷 모델.
//!
//! 메모리, CPU, 배터리, 저장공간, 네트워크 상태를 한 시점에 고정한 불변 스냅샷.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 메모리 압박 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPressure {
    Normal,
    Warning,
    Critical,
}

/// 메모리 상태
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStatus {
    /// 사용량 (바이트)
    pub used: u64,
    /// 전체 용량 (바이트)
    pub total: u64,
    /// 사용 가능 (바이트)
    pub available: u64,
    /// 압박 단계
    pub pressure: MemoryPressure,
    /// 고사용량 여부 (> 80%)
    pub is_high: bool,
}

impl MemoryStatus {
    /// 사용률 (0.0 ~ 100.0)
    pub fn usage_percent(&self) -> f64 {
        percent_of(self.used, self.total)
    }
}

/// CPU 상태
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuStatus {
    /// 사용률 (0.0 ~ 100.0)
    pub usage_percent: f64,
    /// 고사용량 여부 (> 70%)
    pub is_high: bool,
}

/// 배터리 수명 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryHealth {
    Good,
    Fair,
    Poor,
    Unknown,
}

/// 배터리 상태
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// 잔량 (0.0 ~ 1.0)
    pub level: f64,
    pub is_charging: bool,
    pub is_low_power_mode: bool,
    pub health: BatteryHealth,
    /// 충전 사이클 수 (플랫폼이 제공하는 경우)
    pub cycle_count: Option<u32>,
    /// 저잔량 여부 (< 20%)
    pub is_low: bool,
}

/// 저장공간 상태
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageStatus {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    /// 공간 부족 여부 (> 90%)
    pub is_low: bool,
}

impl StorageStatus {
    /// 사용률 (0.0 ~ 100.0)
    pub fn usage_percent(&self) -> f64 {
        percent_of(self.used, self.total)
    }
}

/// 연결 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Ethernet,
    None,
    Unknown,
}

/// 네트워크 상태
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub connection_type: ConnectionType,
    pub is_connected: bool,
    /// 저속 여부 (다운로드 < 5 Mbps 또는 업로드 < 1 Mbps)
    pub is_slow: bool,
}

/// 전체 헬스 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl HealthStatus {
    /// 점수 구간 → 등급
    ///
    /// [80,100] Excellent, [60,80) Good, [40,60) Fair, [0,40) Poor
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Fair,
            _ => Self::Poor,
        }
    }

    /// 표시용 라벨
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// 헬스 스냅샷 (불변)
///
/// 모니터 틱마다 새로 생성되며, 다음 스냅샷으로 대체될 뿐 수정되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub memory: MemoryStatus,
    pub cpu: CpuStatus,
    pub battery: BatteryStatus,
    pub storage: StorageStatus,
    pub network: NetworkStatus,
    /// 수집 시각
    pub timestamp: DateTime<Utc>,
    /// 종합 점수 (0 ~ 100)
    pub overall_score: u8,
    /// 점수 구간 등급
    pub health_status: HealthStatus,
}

/// `part / whole * 100`, whole이 0이면 0
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}
