//! # pulse-alert
//!
//! 헬스 스냅샷 기반 경고/권장 조치 엔진.
//!
//! - [`rules`] — 경고 규칙 (순수 조건식)
//! - [`recommendations`] — 권장 조치 목록 생성
//! - [`engine`] — 중복 억제, 해결/제거 수명 주기, 구독자 연결

pub mod engine;
pub mod recommendations;
pub mod rules;

pub use engine::{AlertEngine, Analysis, StaticUpdateChecker};
