//! 헬스 스냅샷 생성기.
//!
//! 프로브 원시 값 → 파생 플래그 → 감점식 종합 점수 → 등급.
//! 프로브 읽기가 실패하거나 값이 비정상이면 해당 항목만 대체값으로 채운다.

use chrono::{DateTime, Utc};
use pulse_core::error::CoreError;
use pulse_core::models::health::{
    percent_of, BatteryHealth, BatteryStatus, ConnectionType, CpuStatus, HealthSnapshot,
    HealthStatus, MemoryPressure, MemoryStatus, NetworkStatus, StorageStatus,
};
use pulse_core::ports::probe::{
    BatteryReading, MemoryReading, MetricsProbe, NetworkReading, StorageReading,
};
use pulse_core::ports::speed::Throughput;
use tracing::warn;

const GIB: u64 = 1024 * 1024 * 1024;

/// 메모리 고사용량 기준 (%)
const MEMORY_HIGH_PERCENT: f64 = 80.0;
/// 메모리 압박 경고 시작 (%)
const MEMORY_WARNING_PERCENT: f64 = 70.0;
/// 메모리 압박 위험 시작 (%)
const MEMORY_CRITICAL_PERCENT: f64 = 85.0;
/// CPU 고사용량 기준 (%)
const CPU_HIGH_PERCENT: f64 = 70.0;
/// 배터리 저잔량 기준 (0~1)
const BATTERY_LOW_LEVEL: f64 = 0.20;
/// 저장공간 부족 기준 (%)
const STORAGE_LOW_PERCENT: f64 = 90.0;
/// 저속 네트워크 기준 (Mbps)
const SLOW_DOWNLOAD_MBPS: f64 = 5.0;
const SLOW_UPLOAD_MBPS: f64 = 1.0;

/// 배터리 수명 구간 (충전 사이클)
const BATTERY_FAIR_CYCLES: u32 = 500;
const BATTERY_POOR_CYCLES: u32 = 1000;

/// 점수 감점 요인
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreFactors {
    pub memory_high: bool,
    pub cpu_high: bool,
    pub battery_low: bool,
    pub battery_poor: bool,
    pub storage_low: bool,
    pub network_slow: bool,
}

impl ScoreFactors {
    /// 스냅샷 항목에서 감점 요인 추출
    pub fn from_parts(
        memory: &MemoryStatus,
        cpu: &CpuStatus,
        battery: &BatteryStatus,
        storage: &StorageStatus,
        network: &NetworkStatus,
    ) -> Self {
        Self {
            memory_high: memory.is_high,
            cpu_high: cpu.is_high,
            battery_low: battery.is_low,
            battery_poor: battery.health == BatteryHealth::Poor,
            storage_low: storage.is_low,
            network_slow: network.is_slow,
        }
    }
}

/// 감점식 종합 점수 (0 ~ 100)
///
/// 100에서 시작해 요인별 고정 감점을 누적한다. 요인이 겹치면 감점도 겹친다.
pub fn compute_score(factors: &ScoreFactors) -> u8 {
    let mut score: i32 = 100;
    if factors.memory_high {
        score -= 20;
    }
    if factors.cpu_high {
        score -= 15;
    }
    if factors.battery_low {
        score -= 10;
    }
    if factors.battery_poor {
        score -= 15;
    }
    if factors.storage_low {
        score -= 20;
    }
    if factors.network_slow {
        score -= 10;
    }
    score.clamp(0, 100) as u8
}

/// 메모리 사용률 → 압박 단계
pub fn memory_pressure(usage_percent: f64) -> MemoryPressure {
    if usage_percent >= MEMORY_CRITICAL_PERCENT {
        MemoryPressure::Critical
    } else if usage_percent >= MEMORY_WARNING_PERCENT {
        MemoryPressure::Warning
    } else {
        MemoryPressure::Normal
    }
}

/// 충전 사이클 → 배터리 수명
pub fn battery_health(cycle_count: Option<u32>) -> BatteryHealth {
    match cycle_count {
        None => BatteryHealth::Unknown,
        Some(c) if c < BATTERY_FAIR_CYCLES => BatteryHealth::Good,
        Some(c) if c < BATTERY_POOR_CYCLES => BatteryHealth::Fair,
        Some(_) => BatteryHealth::Poor,
    }
}

/// 프로브 원시 값 묶음
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeReadings {
    pub memory: MemoryReading,
    pub cpu_percent: f64,
    pub battery: BatteryReading,
    pub storage: StorageReading,
    pub network: NetworkReading,
}

/// 프로브 실패 시 대체값
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeFallbacks {
    pub memory: MemoryReading,
    pub cpu_percent: f64,
    pub battery: BatteryReading,
    pub storage: StorageReading,
    pub network: NetworkReading,
}

impl Default for ProbeFallbacks {
    fn default() -> Self {
        Self {
            memory: MemoryReading {
                used: 2 * GIB,
                total: 4 * GIB,
            },
            cpu_percent: 0.0,
            battery: BatteryReading {
                level: 1.0,
                is_charging: false,
                is_low_power_mode: false,
                cycle_count: None,
            },
            // 64GB 중 50% 사용
            storage: StorageReading {
                total: 64_000_000_000,
                used: 32_000_000_000,
            },
            network: NetworkReading {
                connection_type: ConnectionType::Unknown,
                is_connected: true,
            },
        }
    }
}

/// 헬스 스냅샷 생성기
#[derive(Debug, Clone, Default)]
pub struct HealthSnapshotBuilder {
    fallbacks: ProbeFallbacks,
}

impl HealthSnapshotBuilder {
    /// 기본 대체값으로 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 대체값 지정
    pub fn with_fallbacks(fallbacks: ProbeFallbacks) -> Self {
        Self { fallbacks }
    }

    /// 프로브를 읽어 스냅샷 생성
    ///
    /// `throughput`이 없으면 연결 유형별 명목 처리량을 사용한다.
    pub async fn build(
        &self,
        probe: &dyn MetricsProbe,
        throughput: Option<Throughput>,
    ) -> HealthSnapshot {
        let readings = self.collect(probe).await;
        self.assemble(&readings, throughput, Utc::now())
    }

    /// 프로브 읽기 (항목별 실패 시 대체값)
    pub async fn collect(&self, probe: &dyn MetricsProbe) -> ProbeReadings {
        let memory = or_fallback(
            "memory",
            probe.read_memory().await.and_then(validate_memory),
            self.fallbacks.memory,
        );
        let cpu_percent = or_fallback(
            "cpu",
            probe.read_cpu().await.and_then(validate_cpu),
            self.fallbacks.cpu_percent,
        );
        let battery = or_fallback(
            "battery",
            probe.read_battery().await.and_then(validate_battery),
            self.fallbacks.battery,
        );
        let storage = or_fallback(
            "storage",
            probe.read_storage().await.and_then(validate_storage),
            self.fallbacks.storage,
        );
        let network = or_fallback("network", probe.read_network().await, self.fallbacks.network);

        ProbeReadings {
            memory,
            cpu_percent,
            battery,
            storage,
            network,
        }
    }

    /// 원시 값 → 스냅샷 (순수 함수)
    pub fn assemble(
        &self,
        readings: &ProbeReadings,
        throughput: Option<Throughput>,
        timestamp: DateTime<Utc>,
    ) -> HealthSnapshot {
        let mem = readings.memory;
        let memory_percent = percent_of(mem.used, mem.total);
        let memory = MemoryStatus {
            used: mem.used,
            total: mem.total,
            available: mem.total.saturating_sub(mem.used),
            pressure: memory_pressure(memory_percent),
            is_high: memory_percent > MEMORY_HIGH_PERCENT,
        };

        let cpu = CpuStatus {
            usage_percent: readings.cpu_percent,
            is_high: readings.cpu_percent > CPU_HIGH_PERCENT,
        };

        let bat = readings.battery;
        let battery = BatteryStatus {
            level: bat.level,
            is_charging: bat.is_charging,
            is_low_power_mode: bat.is_low_power_mode,
            health: battery_health(bat.cycle_count),
            cycle_count: bat.cycle_count,
            is_low: bat.level < BATTERY_LOW_LEVEL,
        };

        let st = readings.storage;
        let storage = StorageStatus {
            total: st.total,
            used: st.used,
            available: st.total.saturating_sub(st.used),
            is_low: percent_of(st.used, st.total) > STORAGE_LOW_PERCENT,
        };

        let net = readings.network;
        let speed = if net.is_connected {
            throughput.unwrap_or_else(|| Throughput::nominal(net.connection_type, true))
        } else {
            Throughput::nominal(net.connection_type, false)
        };
        let network = NetworkStatus {
            download_mbps: speed.download_mbps,
            upload_mbps: speed.upload_mbps,
            connection_type: net.connection_type,
            is_connected: net.is_connected,
            is_slow: speed.download_mbps < SLOW_DOWNLOAD_MBPS
                || speed.upload_mbps < SLOW_UPLOAD_MBPS,
        };

        let factors = ScoreFactors::from_parts(&memory, &cpu, &battery, &storage, &network);
        let overall_score = compute_score(&factors);

        HealthSnapshot {
            memory,
            cpu,
            battery,
            storage,
            network,
            timestamp,
            overall_score,
            health_status: HealthStatus::from_score(overall_score),
        }
    }
}

fn or_fallback<T>(metric: &str, result: Result<T, CoreError>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{metric} 읽기 실패, 대체값 사용: {e}");
            fallback
        }
    }
}

fn validate_memory(reading: MemoryReading) -> Result<MemoryReading, CoreError> {
    if reading.total == 0 || reading.used > reading.total {
        return Err(CoreError::invalid(
            "memory",
            format!("비정상 값: used={} total={}", reading.used, reading.total),
        ));
    }
    Ok(reading)
}

fn validate_cpu(percent: f64) -> Result<f64, CoreError> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(CoreError::invalid("cpu", format!("0~100 범위를 벗어남: {percent}")));
    }
    Ok(percent)
}

fn validate_battery(reading: BatteryReading) -> Result<BatteryReading, CoreError> {
    if !reading.level.is_finite() || !(0.0..=1.0).contains(&reading.level) {
        return Err(CoreError::invalid(
            "battery",
            format!("잔량 0~1 범위를 벗어남: {}", reading.level),
        ));
    }
    Ok(reading)
}

fn validate_storage(reading: StorageReading) -> Result<StorageReading, CoreError> {
    if reading.total == 0 || reading.used > reading.total {
        return Err(CoreError::invalid(
            "storage",
            format!("비정상 값: used={} total={}", reading.used, reading.total),
        ));
    }
    Ok(reading)
}
