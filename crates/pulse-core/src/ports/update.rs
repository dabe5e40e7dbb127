//! 시스템 업데이트 확인 포트.

use async_trait::async_trait;

use crate::error::CoreError;

/// 대기 중인 보안 업데이트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityUpdate {
    /// 업데이트 버전 (예: "17.4.1")
    pub version: String,
    pub summary: String,
}

/// 업데이트 확인기
#[async_trait]
pub trait UpdateChecker: Send + Sync {
    /// 대기 중인 보안 업데이트 조회 (없으면 None)
    async fn pending_security_update(&self) -> Result<Option<SecurityUpdate>, CoreError>;
}
