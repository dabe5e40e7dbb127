//! 시스템 리소스 프로브.
//!
//! `MetricsProbe` 포트 구현. sysinfo 기반 메모리/CPU/디스크/네트워크 수집.
//! 데스크톱 환경에는 배터리 API가 없으므로 배터리는 항상 `ProbeUnavailable`.

use async_trait::async_trait;
use pulse_core::error::CoreError;
use pulse_core::models::health::ConnectionType;
use pulse_core::ports::probe::{
    BatteryReading, MemoryReading, MetricsProbe, NetworkReading, StorageReading,
};
use std::sync::Mutex;
use sysinfo::{Disks, Networks, System};
use tracing::debug;

/// sysinfo 기반 프로브
pub struct SysInfoProbe {
    sys: Mutex<System>,
}

impl SysInfoProbe {
    /// 새 프로브 생성
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new_all()),
        }
    }
}

impl Default for SysInfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// 인터페이스 이름 → 연결 유형 추정
pub fn classify_interface(name: &str) -> Option<ConnectionType> {
    let name = name.to_ascii_lowercase();
    if name.starts_with("lo") {
        None
    } else if name.starts_with("wl") || name.starts_with("wifi") {
        Some(ConnectionType::Wifi)
    } else if name.starts_with("rmnet") || name.starts_with("wwan") || name.starts_with("pdp_ip")
    {
        Some(ConnectionType::Cellular)
    } else if name.starts_with("en") || name.starts_with("eth") {
        Some(ConnectionType::Ethernet)
    } else {
        Some(ConnectionType::Unknown)
    }
}

#[async_trait]
impl MetricsProbe for SysInfoProbe {
    async fn read_memory(&self) -> Result<MemoryReading, CoreError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|e| CoreError::Internal(format!("시스템 잠금 실패: {e}")))?;
        sys.refresh_memory();

        let reading = MemoryReading {
            used: sys.used_memory(),
            total: sys.total_memory(),
        };
        debug!(
            "메모리: {}/{}MB",
            reading.used / 1_048_576,
            reading.total / 1_048_576
        );
        Ok(reading)
    }

    async fn read_cpu(&self) -> Result<f64, CoreError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|e| CoreError::Internal(format!("시스템 잠금 실패: {e}")))?;
        sys.refresh_cpu_usage();
        Ok(f64::from(sys.global_cpu_usage()))
    }

    async fn read_battery(&self) -> Result<BatteryReading, CoreError> {
        Err(CoreError::ProbeUnavailable(
            "배터리 정보를 제공하지 않는 플랫폼".to_string(),
        ))
    }

    async fn read_storage(&self) -> Result<StorageReading, CoreError> {
        let disks = Disks::new_with_refreshed_list();
        let (used, total) = disks.list().iter().fold((0u64, 0u64), |(used, total), d| {
            (
                used + d.total_space().saturating_sub(d.available_space()),
                total + d.total_space(),
            )
        });
        if total == 0 {
            return Err(CoreError::ProbeUnavailable("디스크 없음".to_string()));
        }
        Ok(StorageReading { total, used })
    }

    async fn read_network(&self) -> Result<NetworkReading, CoreError> {
        let networks = Networks::new_with_refreshed_list();

        // 트래픽이 있었던 인터페이스 중 첫 번째 유형
        let mut active: Vec<ConnectionType> = networks
            .list()
            .iter()
            .filter(|(_, data)| data.total_received() > 0 || data.total_transmitted() > 0)
            .filter_map(|(name, _)| classify_interface(name))
            .collect();
        active.sort_by_key(|t| match t {
            ConnectionType::Ethernet => 0,
            ConnectionType::Wifi => 1,
            ConnectionType::Cellular => 2,
            _ => 3,
        });

        let reading = match active.first() {
            Some(&connection_type) => NetworkReading {
                connection_type,
                is_connected: true,
            },
            None => NetworkReading {
                connection_type: ConnectionType::None,
                is_connected: false,
            },
        };
        debug!("네트워크: {:?}", reading);
        Ok(reading)
    }
}
