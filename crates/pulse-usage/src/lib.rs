//! # pulse-usage
//!
//! 앱별 데이터 사용량 추적.
//!
//! - [`tracker`] — 누적 카운터, 주기 틱, 조회/초기화
//! - [`ledger`] — 날짜별 증분 누계 (기간 한도, 기간 초기화 기준)
//! - [`limits`] — 사용 한도 CRUD, 임계값 평가, 사용량 경고
//! - [`period`] — 기간 경계 계산, 집계/통계/차트 (상태 없음)
//! - [`synthetic`] — 결정적 모의 증분 생성기

pub mod ledger;
pub mod limits;
pub mod period;
pub mod synthetic;
pub mod tracker;

pub use limits::LimitBook;
pub use synthetic::{demo_apps, SyntheticUsageSource};
pub use tracker::{TrackerOptions, UsageTracker};
