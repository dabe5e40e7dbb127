//! # pulse-storage
//!
//! 영속화 어댑터.
//!
//! - [`settings`] — `SettingsStore` 구현 (메모리, JSON 파일)
//! - [`export`] — 헬스 데이터 내보내기 (JSON/CSV, 원자적 파일 쓰기)

pub mod export;
pub mod settings;

pub use export::{export_snapshot, ExportDocument, ExportFormat, ExportMetadata, Exporter};
pub use settings::{JsonSettingsStore, MemorySettingsStore};
