//! 네트워크 속도 측정 포트.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::health::ConnectionType;

/// 측정된 처리량 (Mbps)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Throughput {
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

impl Throughput {
    pub const fn new(download_mbps: f64, upload_mbps: f64) -> Self {
        Self {
            download_mbps,
            upload_mbps,
        }
    }

    /// 측정값이 없을 때 쓰는 연결 유형별 명목 처리량
    pub fn nominal(connection_type: ConnectionType, is_connected: bool) -> Self {
        if !is_connected {
            return Self::new(0.0, 0.0);
        }
        match connection_type {
            ConnectionType::Wifi => Self::new(50.0, 10.0),
            ConnectionType::Ethernet => Self::new(100.0, 50.0),
            ConnectionType::Cellular => Self::new(20.0, 5.0),
            ConnectionType::Unknown => Self::new(10.0, 2.0),
            ConnectionType::None => Self::new(0.0, 0.0),
        }
    }
}

/// 속도 측정기 (호출 측에서 타임아웃을 건다)
#[async_trait]
pub trait SpeedTester: Send + Sync {
    async fn measure(&self, connection_type: ConnectionType) -> Result<Throughput, CoreError>;
}
