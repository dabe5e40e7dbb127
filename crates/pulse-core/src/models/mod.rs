//! PULSE 도메인 모델.
//!
//! 헬스 스냅샷, 경고/권장 조치, 데이터 사용량, 집계 기간.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod alert;
pub mod health;
pub mod period;
pub mod usage;
