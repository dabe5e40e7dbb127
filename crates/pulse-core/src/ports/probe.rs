//! 메트릭 프로브 포트.
//!
//! 구현: `pulse-monitor` crate (`SysInfoProbe`, sysinfo 기반)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::health::ConnectionType;

/// 메모리 원시 값
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryReading {
    pub used: u64,
    pub total: u64,
}

/// 배터리 원시 값
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// 잔량 (0.0 ~ 1.0)
    pub level: f64,
    pub is_charging: bool,
    pub is_low_power_mode: bool,
    pub cycle_count: Option<u32>,
}

/// 저장공간 원시 값
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageReading {
    pub total: u64,
    pub used: u64,
}

/// 네트워크 원시 값
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkReading {
    pub connection_type: ConnectionType,
    pub is_connected: bool,
}

/// 디바이스 메트릭 원시 값 공급자
///
/// 각 읽기는 독립적으로 실패할 수 있으며, 실패한 항목만 대체값으로 채워진다.
#[async_trait]
pub trait MetricsProbe: Send + Sync {
    async fn read_memory(&self) -> Result<MemoryReading, CoreError>;

    /// CPU 사용률 (0.0 ~ 100.0)
    async fn read_cpu(&self) -> Result<f64, CoreError>;

    async fn read_battery(&self) -> Result<BatteryReading, CoreError>;

    async fn read_storage(&self) -> Result<StorageReading, CoreError>;

    async fn read_network(&self) -> Result<NetworkReading, CoreError>;
}
