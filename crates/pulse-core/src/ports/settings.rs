//! 사용자 설정 저장소 포트.
//!
//! 스키마 없는 키/값 저장소. 값은 원시 타입만 허용한다.
//! 구현: `pulse-storage` crate (`MemorySettingsStore`, `JsonSettingsStore`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CoreError;

/// 설정 값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// 잘 알려진 설정 키
pub mod keys {
    /// 알림 전체 토글
    pub const NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
    /// 모니터 갱신 주기 (초)
    pub const REFRESH_INTERVAL_SECS: &str = "refresh_interval_secs";
    /// 대시보드 경고 표시
    pub const SHOW_ALERTS: &str = "show_alerts";
}

/// 키/값 설정 저장소
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<SettingValue>;

    fn set(&self, key: &str, value: SettingValue) -> Result<(), CoreError>;

    fn remove(&self, key: &str) -> Result<(), CoreError>;

    /// 전체 설정 복사본 (내보내기용)
    fn snapshot(&self) -> BTreeMap<String, SettingValue>;
}

/// 잘 알려진 키에 대한 타입 지정 뷰
#[derive(Clone)]
pub struct UserSettings {
    store: Arc<dyn SettingsStore>,
}

impl UserSettings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// 알림 토글 (기본 true)
    pub fn notifications_enabled(&self) -> bool {
        self.store
            .get(keys::NOTIFICATIONS_ENABLED)
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<(), CoreError> {
        self.store
            .set(keys::NOTIFICATIONS_ENABLED, SettingValue::Bool(enabled))
    }

    /// 갱신 주기 (설정 없거나 0 이하이면 None)
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.store
            .get(keys::REFRESH_INTERVAL_SECS)
            .and_then(|v| v.as_int())
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64))
    }

    pub fn set_refresh_interval(&self, interval: Duration) -> Result<(), CoreError> {
        let secs = interval.as_secs();
        if secs == 0 {
            return Err(CoreError::invalid(
                keys::REFRESH_INTERVAL_SECS,
                "갱신 주기는 1초 이상이어야 합니다",
            ));
        }
        self.store
            .set(keys::REFRESH_INTERVAL_SECS, SettingValue::Int(secs as i64))
    }

    /// 경고 표시 여부 (기본 true)
    pub fn show_alerts(&self) -> bool {
        self.store
            .get(keys::SHOW_ALERTS)
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    pub fn set_show_alerts(&self, show: bool) -> Result<(), CoreError> {
        self.store.set(keys::SHOW_ALERTS, SettingValue::Bool(show))
    }

    /// 내부 저장소
    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }
}
