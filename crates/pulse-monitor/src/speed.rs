//! 네트워크 속도 측정기.

use async_trait::async_trait;
use pulse_core::error::CoreError;
use pulse_core::models::health::ConnectionType;
use pulse_core::ports::speed::{SpeedTester, Throughput};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 측정 지연만 흉내 내고 연결 유형별 명목 처리량을 돌려주는 측정기
#[derive(Debug, Clone)]
pub struct SimulatedSpeedTester {
    delay: Duration,
}

impl SimulatedSpeedTester {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(1_500),
        }
    }

    /// 측정 지연 지정
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedSpeedTester {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeedTester for SimulatedSpeedTester {
    async fn measure(&self, connection_type: ConnectionType) -> Result<Throughput, CoreError> {
        sleep(self.delay).await;
        let is_connected = connection_type != ConnectionType::None;
        let throughput = Throughput::nominal(connection_type, is_connected);
        debug!(
            "속도 측정 완료: {:?} ↓{:.1} ↑{:.1} Mbps",
            connection_type, throughput.download_mbps, throughput.upload_mbps
        );
        Ok(throughput)
    }
}
