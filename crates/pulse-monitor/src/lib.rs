//! # pulse-monitor
//!
//! 디바이스 헬스 모니터링.
//!
//! - [`builder`] — 프로브 값 → `HealthSnapshot` (점수/등급 계산)
//! - [`monitor`] — 주기 샘플링 루프, 게시, 구독자 호출
//! - [`history`] — 차트용 스냅샷 이력 구독자
//! - [`sysinfo_probe`] — sysinfo 기반 `MetricsProbe` 구현
//! - [`speed`] — 모의 네트워크 속도 측정기

pub mod builder;
pub mod history;
pub mod monitor;
pub mod speed;
pub mod sysinfo_probe;

pub use builder::HealthSnapshotBuilder;
pub use history::HealthHistory;
pub use monitor::{MetricsMonitor, MonitorOptions};
pub use speed::SimulatedSpeedTester;
pub use sysinfo_probe::SysInfoProbe;
