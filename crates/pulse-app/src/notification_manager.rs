//! 알림 관리자.
//!
//! 설정에 따라 조건부로 경고 알림을 발송한다. 경고 엔진과 사용량 추적기의
//! `AlertSink`로 등록된다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::config::NotificationConfig;
use pulse_core::models::alert::{Alert, AlertKind};
use pulse_core::models::usage::{ThresholdLevel, UsageAlert};
use pulse_core::ports::notifier::Notifier;
use pulse_core::ports::settings::UserSettings;
use pulse_core::ports::subscriber::AlertSink;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 같은 유형 경고 재알림 최소 간격
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// 알림 상태 (중복 방지용)
#[derive(Debug, Default)]
struct NotificationState {
    /// 유형별 마지막 알림 시간
    last_sent: HashMap<AlertKind, DateTime<Utc>>,
    /// 발송 횟수
    sent: u64,
}

/// 알림 관리자
pub struct NotificationManager {
    config: NotificationConfig,
    settings: Option<UserSettings>,
    notifier: Arc<dyn Notifier>,
    cooldown: Duration,
    state: RwLock<NotificationState>,
}

impl NotificationManager {
    pub fn new(config: NotificationConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            settings: None,
            notifier,
            cooldown: DEFAULT_COOLDOWN,
            state: RwLock::new(NotificationState::default()),
        }
    }

    /// 사용자 알림 토글 연결
    pub fn with_settings(mut self, settings: UserSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// 지금까지 발송한 알림 수
    pub async fn sent_count(&self) -> u64 {
        self.state.read().await.sent
    }

    fn user_enabled(&self) -> bool {
        self.settings
            .as_ref()
            .map_or(true, |s| s.notifications_enabled())
    }

    fn user_shows_alerts(&self) -> bool {
        self.settings.as_ref().map_or(true, |s| s.show_alerts())
    }

    /// 시스템 경고 알림
    ///
    /// 같은 유형은 쿨다운 안에서 한 번만 보낸다.
    pub async fn notify_alert(&self, alert: &Alert) {
        if !self.config.enabled || !self.config.health_alerts {
            return;
        }
        if !self.user_enabled() || !self.user_shows_alerts() {
            return;
        }

        let mut state = self.state.write().await;
        let now = Utc::now();
        if let Some(last) = state.last_sent.get(&alert.kind) {
            let elapsed = (now - *last).to_std().unwrap_or_default();
            if elapsed < self.cooldown {
                debug!("알림 쿨다운 중: {}", alert.kind.as_str());
                return;
            }
        }

        let title = format!("{} {}", severity_icon(alert), alert.title);
        let sent = self.notifier.show_notification(&title, &alert.message);
        if let Err(e) = sent.await {
            debug!("경고 알림 실패: {e}");
        } else {
            state.last_sent.insert(alert.kind, now);
            state.sent += 1;
            info!("경고 알림 발송: {}", alert.kind.as_str());
        }
    }

    /// 사용량 경고 알림 (경고 자체가 임계값별로 중복 제거되어 있음)
    pub async fn notify_usage(&self, alert: &UsageAlert) {
        if !self.config.enabled || !self.config.usage_alerts {
            return;
        }
        if !self.user_enabled() {
            return;
        }

        let title = match alert.threshold.level {
            ThresholdLevel::Warning => "📶 데이터 사용량 경고",
            ThresholdLevel::Critical => "🚨 데이터 한도 임박",
        };
        let body = format!(
            "{} 사용량이 한도의 {:.0}%입니다.",
            alert.limit_type.as_str(),
            alert.usage_percentage()
        );

        if let Err(e) = self.notifier.show_notification(title, &body).await {
            debug!("사용량 알림 실패: {e}");
        } else {
            self.state.write().await.sent += 1;
            info!("사용량 알림 발송: {}", alert.limit_type.as_str());
        }
    }
}

fn severity_icon(alert: &Alert) -> &'static str {
    use pulse_core::models::alert::Severity;
    match alert.severity {
        Severity::Critical => "🚨",
        Severity::High => "⚠️",
        Severity::Medium => "🔶",
        Severity::Low => "ℹ️",
    }
}

#[async_trait]
impl AlertSink for NotificationManager {
    async fn alert_raised(&self, alert: &Alert) {
        self.notify_alert(alert).await;
    }

    async fn usage_alert_raised(&self, alert: &UsageAlert) {
        self.notify_usage(alert).await;
    }
}
