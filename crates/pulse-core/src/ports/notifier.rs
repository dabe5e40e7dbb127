//! 알림 전달 포트.
//!
//! 구현: `pulse-app` crate (`LogNotifier`)

use async_trait::async_trait;

use crate::error::CoreError;

/// 사용자 알림 전달 인터페이스
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 일반 알림 표시 (제목 + 본문)
    async fn show_notification(&self, title: &str, body: &str) -> Result<(), CoreError>;
}
