//! 설정 저장소 어댑터.
//!
//! `SettingsStore` 포트 구현: 메모리 전용과 JSON 파일 기반.

use parking_lot::RwLock;
use pulse_core::error::CoreError;
use pulse_core::ports::settings::{SettingValue, SettingsStore};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 설정 파일 이름
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// 메모리 전용 저장소 (테스트, 임시 세션)
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<BTreeMap<String, SettingValue>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: SettingValue) -> Result<(), CoreError> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.values.write().remove(key);
        Ok(())
    }

    fn snapshot(&self) -> BTreeMap<String, SettingValue> {
        self.values.read().clone()
    }
}

/// JSON 파일 기반 저장소
///
/// 변경마다 파일 전체를 임시 파일에 쓰고 교체한다.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, SettingValue>>,
}

impl JsonSettingsStore {
    /// 파일 열기 (없으면 빈 저장소)
    pub fn open(path: PathBuf) -> Result<Self, CoreError> {
        let values = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
            })?;
            serde_json::from_str(&content).map_err(|e| {
                CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };
        debug!("사용자 설정 로드: {} ({}개)", path.display(), values.len());
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, SettingValue>) -> Result<(), CoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let content = serde_json::to_string_pretty(values)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| CoreError::Io(e.error))?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: SettingValue) -> Result<(), CoreError> {
        let mut values = self.values.write();
        let previous = values.insert(key.to_string(), value);
        if let Err(e) = self.persist(&values) {
            // 저장 실패 시 메모리 상태 되돌림
            match previous {
                Some(v) => values.insert(key.to_string(), v),
                None => values.remove(key),
            };
            return Err(e);
        }
        info!("설정 변경: {key}");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut values = self.values.write();
        let Some(previous) = values.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&values) {
            values.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn snapshot(&self) -> BTreeMap<String, SettingValue> {
        self.values.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pulse_core::ports::settings::{keys, UserSettings};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemorySettingsStore::new();
        store.set("k", SettingValue::Int(3)).unwrap();
        assert_eq!(store.get("k"), Some(SettingValue::Int(3)));
        store.remove("k").unwrap();
        assert!(store.get("k").is_none());
    }

    #[test]
    fn json_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);

        let store = Arc::new(JsonSettingsStore::open(path.clone()).unwrap());
        let settings = UserSettings::new(store);
        settings.set_notifications_enabled(false).unwrap();
        settings
            .set_refresh_interval(Duration::from_secs(10))
            .unwrap();

        let reopened = JsonSettingsStore::open(path).unwrap();
        assert_eq!(
            reopened.get(keys::NOTIFICATIONS_ENABLED),
            Some(SettingValue::Bool(false))
        );
        assert_eq!(
            reopened.get(keys::REFRESH_INTERVAL_SECS),
            Some(SettingValue::Int(10))
        );
        assert_eq!(reopened.snapshot().len(), 2);
    }

    #[test]
    fn json_store_remove_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let store = JsonSettingsStore::open(path.clone()).unwrap();
        store
            .set(keys::SHOW_ALERTS, SettingValue::Bool(true))
            .unwrap();
        store.remove(keys::SHOW_ALERTS).unwrap();
        store.remove("missing").unwrap();

        let reopened = JsonSettingsStore::open(path).unwrap();
        assert!(reopened.snapshot().is_empty());
    }

    #[test]
    fn corrupt_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "not json").unwrap();
        assert_matches!(JsonSettingsStore::open(path), Err(CoreError::Config(_)));
    }
}
