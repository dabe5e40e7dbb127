//! 애플리케이션 설정 구조체.
//!
//! 모니터/사용량 추적 주기, 이력 용량, 알림, 내보내기 경로 등
//! 런타임 설정을 정의한다. `ConfigManager`를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 헬스 모니터 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 데이터 사용량 추적 설정
    #[serde(default)]
    pub usage: UsageConfig,
    /// 알림 설정
    #[serde(default)]
    pub notification: NotificationConfig,
    /// 내보내기 설정
    #[serde(default)]
    pub export: ExportConfig,
}

// ============================================================
// 모니터 설정
// ============================================================

/// 헬스 모니터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 스냅샷 샘플링 주기 (밀리초)
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// 차트용 스냅샷 이력 보존 개수
    #[serde(default = "default_snapshot_history")]
    pub history_capacity: usize,
    /// 속도 측정 타임아웃 (밀리초)
    #[serde(default = "default_speed_test_timeout_ms")]
    pub speed_test_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            history_capacity: default_snapshot_history(),
            speed_test_timeout_ms: default_speed_test_timeout_ms(),
        }
    }
}

// ============================================================
// 사용량 추적 설정
// ============================================================

/// 데이터 사용량 추적 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// 사용량 틱 주기 (밀리초)
    #[serde(default = "default_usage_tick_ms")]
    pub tick_interval_ms: u64,
    /// 사용량 요약 이력 보존 개수
    #[serde(default = "default_usage_history")]
    pub history_capacity: usize,
    /// 보존할 사용량 경고 최대 개수
    #[serde(default = "default_max_usage_alerts")]
    pub max_usage_alerts: usize,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_usage_tick_ms(),
            history_capacity: default_usage_history(),
            max_usage_alerts: default_max_usage_alerts(),
        }
    }
}

// ============================================================
// 알림 설정
// ============================================================

/// 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// 알림 전체 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 시스템 경고 알림
    #[serde(default = "default_true")]
    pub health_alerts: bool,
    /// 사용량 경고 알림
    #[serde(default = "default_true")]
    pub usage_alerts: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            health_alerts: true,
            usage_alerts: true,
        }
    }
}

// ============================================================
// 내보내기 설정
// ============================================================

/// 내보내기 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// 내보내기 디렉토리 (None이면 플랫폼 데이터 디렉토리)
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            usage: UsageConfig::default(),
            notification: NotificationConfig::default(),
            export: ExportConfig::default(),
        }
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.monitor.sample_interval_ms == 0 {
            return Err(CoreError::Config(
                "monitor.sample_interval_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.usage.tick_interval_ms == 0 {
            return Err(CoreError::Config(
                "usage.tick_interval_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.usage.max_usage_alerts == 0 {
            return Err(CoreError::Config(
                "usage.max_usage_alerts는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 샘플링 주기를 Duration으로 반환
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.sample_interval_ms)
    }

    /// 사용량 틱 주기를 Duration으로 반환
    pub fn usage_tick_interval(&self) -> Duration {
        Duration::from_millis(self.usage.tick_interval_ms)
    }

    /// 속도 측정 타임아웃을 Duration으로 반환
    pub fn speed_test_timeout(&self) -> Duration {
        Duration::from_millis(self.monitor.speed_test_timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}
fn default_sample_interval_ms() -> u64 {
    5_000
}
fn default_snapshot_history() -> usize {
    120
}
fn default_speed_test_timeout_ms() -> u64 {
    3_000
}
fn default_usage_tick_ms() -> u64 {
    30_000
}
fn default_usage_history() -> usize {
    100
}
fn default_max_usage_alerts() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default_config();
        assert_eq!(config.monitor.sample_interval_ms, 5_000);
        assert_eq!(config.usage.tick_interval_ms, 30_000);
        assert_eq!(config.usage.history_capacity, 100);
        assert_eq!(config.usage.max_usage_alerts, 50);
        assert!(config.notification.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"monitor":{"sample_interval_ms":1000}}"#).unwrap();
        assert_eq!(config.sample_interval(), Duration::from_millis(1000));
        assert_eq!(config.monitor.history_capacity, 120);
        assert_eq!(config.usage.tick_interval_ms, 30_000);
    }

    #[test]
    fn zero_interval_invalid() {
        let mut config = AppConfig::default_config();
        config.monitor.sample_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
