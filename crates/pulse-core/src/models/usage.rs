//! 데이터 사용량 모델.
//!
//! 앱별 바이트 카운터, 기간 요약, 사용 한도/임계값, 사용량 경고.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::period::{Period, PeriodType};

/// 증분이 귀속되는 네트워크 (한 증분은 둘 중 하나에만 귀속)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Cellular,
    Wifi,
}

/// 앱별 사용량
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppUsage {
    /// 고유 키
    pub bundle_id: String,
    pub display_name: String,
    pub cellular_bytes: u64,
    pub wifi_bytes: u64,
}

impl AppUsage {
    /// 카운터 0으로 시작
    pub fn new(bundle_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            display_name: display_name.into(),
            cellular_bytes: 0,
            wifi_bytes: 0,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.cellular_bytes.saturating_add(self.wifi_bytes)
    }

    /// 증분 누적 (단조 증가)
    pub fn add(&mut self, network: NetworkKind, bytes: u64) {
        match network {
            NetworkKind::Cellular => {
                self.cellular_bytes = self.cellular_bytes.saturating_add(bytes)
            }
            NetworkKind::Wifi => self.wifi_bytes = self.wifi_bytes.saturating_add(bytes),
        }
    }

    /// 다른 항목의 바이트를 합산
    pub fn merge(&mut self, other: &AppUsage) {
        self.cellular_bytes = self.cellular_bytes.saturating_add(other.cellular_bytes);
        self.wifi_bytes = self.wifi_bytes.saturating_add(other.wifi_bytes);
    }

    /// 카운터 초기화
    pub fn reset(&mut self) {
        self.cellular_bytes = 0;
        self.wifi_bytes = 0;
    }
}

/// 한 틱 동안 한 앱에서 발생한 사용량 증분
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageDelta {
    pub bundle_id: String,
    pub network: NetworkKind,
    pub bytes: u64,
}

/// 기간 사용량 요약 (불변)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    pub period: Period,
    pub total_cellular_bytes: u64,
    pub total_wifi_bytes: u64,
    /// 앱별 값 복사본
    pub apps: Vec<AppUsage>,
    pub timestamp: DateTime<Utc>,
}

impl UsageSummary {
    /// 앱 목록에서 합계를 계산해 요약 생성
    pub fn from_apps(period: Period, apps: Vec<AppUsage>, timestamp: DateTime<Utc>) -> Self {
        let (total_cellular_bytes, total_wifi_bytes) =
            apps.iter().fold((0u64, 0u64), |(cell, wifi), app| {
                (
                    cell.saturating_add(app.cellular_bytes),
                    wifi.saturating_add(app.wifi_bytes),
                )
            });
        Self {
            period,
            total_cellular_bytes,
            total_wifi_bytes,
            apps,
            timestamp,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_cellular_bytes
            .saturating_add(self.total_wifi_bytes)
    }
}

/// 한도 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitType {
    Cellular,
    Wifi,
    Total,
}

impl LimitType {
    /// 유형에 해당하는 사용량 선택
    pub fn select(&self, cellular: u64, wifi: u64) -> u64 {
        match self {
            Self::Cellular => cellular,
            Self::Wifi => wifi,
            Self::Total => cellular.saturating_add(wifi),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cellular => "cellular",
            Self::Wifi => "wifi",
            Self::Total => "total",
        }
    }
}

/// 임계값 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdLevel {
    Warning,
    Critical,
}

/// 경고 임계값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThreshold {
    pub id: Uuid,
    /// 한도 대비 비율 (0 ~ 100)
    pub percentage: f64,
    pub is_enabled: bool,
    pub level: ThresholdLevel,
}

impl AlertThreshold {
    /// 새 임계값 (0~100 범위 밖이면 `InvalidArgument`)
    pub fn new(percentage: f64, level: ThresholdLevel) -> Result<Self, CoreError> {
        validate_percentage(percentage)?;
        Ok(Self {
            id: Uuid::new_v4(),
            percentage,
            is_enabled: true,
            level,
        })
    }
}

fn validate_percentage(percentage: f64) -> Result<(), CoreError> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(CoreError::invalid(
            "percentage",
            format!("0~100 범위를 벗어남: {percentage}"),
        ));
    }
    Ok(())
}

/// 사용 한도
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLimit {
    pub id: Uuid,
    pub limit_type: LimitType,
    /// 한도 (바이트, 0 초과)
    pub limit_value: u64,
    pub period_type: PeriodType,
    pub is_enabled: bool,
    /// 평가 순서와 무관 (활성 임계값 전부 매 패스 검사)
    pub thresholds: Vec<AlertThreshold>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UsageLimit {
    /// 새 한도 (limit_value 0, 범위 밖 임계값이면 `InvalidArgument`)
    pub fn new(
        limit_type: LimitType,
        limit_value: u64,
        period_type: PeriodType,
        thresholds: Vec<AlertThreshold>,
    ) -> Result<Self, CoreError> {
        let now = Utc::now();
        let limit = Self {
            id: Uuid::new_v4(),
            limit_type,
            limit_value,
            period_type,
            is_enabled: true,
            thresholds,
            created_at: now,
            updated_at: now,
        };
        limit.validate()?;
        Ok(limit)
    }

    /// 필드 유효성 검사 (수정 경로에서도 사용)
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.limit_value == 0 {
            return Err(CoreError::invalid(
                "limit_value",
                "한도는 0보다 커야 합니다",
            ));
        }
        // 한도 기간은 평가 시점 기준으로 계산
        if self.period_type == PeriodType::Custom {
            return Err(CoreError::invalid(
                "period_type",
                "한도 기간은 today/this_week/this_month/last_month 중 하나여야 합니다",
            ));
        }
        for threshold in &self.thresholds {
            validate_percentage(threshold.percentage)?;
        }
        Ok(())
    }

    /// 현재 사용량의 한도 대비 비율
    pub fn usage_percentage(&self, current_usage: u64) -> f64 {
        crate::models::health::percent_of(current_usage, self.limit_value)
    }
}

/// 사용량 경고
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageAlert {
    pub id: Uuid,
    pub limit_type: LimitType,
    pub current_usage: u64,
    pub limit_value: u64,
    /// 발생 당시 임계값 (값 복사)
    pub threshold: AlertThreshold,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

impl UsageAlert {
    /// 현재 사용률
    pub fn usage_percentage(&self) -> f64 {
        crate::models::health::percent_of(self.current_usage, self.limit_value)
    }
}

/// 기간 통계
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub period: Period,
    /// 기간 내 요약 total 합 / 요약 개수
    pub average_daily_bytes: u64,
    pub peak_bytes: u64,
    /// 최댓값에 처음 도달한 요약의 시각
    pub peak_date: Option<DateTime<Utc>>,
    pub most_used: Option<AppUsage>,
    pub least_used: Option<AppUsage>,
    pub sample_count: usize,
}

/// 차트 한 점
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub cellular: u64,
    pub wifi: u64,
    pub total: u64,
}
