//! 헬스 데이터 내보내기.
//!
//! 메타데이터, 설정, 헬스 이력, 경고, 권장 조치를 하나의 문서로 묶어
//! JSON(계층형) 또는 CSV(구역별 평면 표)로 렌더링한다.

use chrono::{DateTime, Utc};
use pulse_core::error::CoreError;
use pulse_core::models::alert::{Alert, Recommendation};
use pulse_core::models::health::HealthSnapshot;
use pulse_core::ports::settings::SettingValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// 내보내기 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(CoreError::invalid(
                "format",
                format!("지원하지 않는 형식: {other}"),
            )),
        }
    }
}

/// 기기 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub os: String,
    pub arch: String,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub host_name: Option<String>,
}

impl DeviceDescriptor {
    /// 컴파일 대상 기준 기본 정보
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            os_version: None,
            host_name: None,
        }
    }

    fn label(&self) -> String {
        let mut label = format!("{} {}", self.os, self.arch);
        if let Some(version) = &self.os_version {
            label.push_str(&format!(" ({version})"));
        }
        if let Some(host) = &self.host_name {
            label.push_str(&format!(" @{host}"));
        }
        label
    }
}

/// 내보내기 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub app_version: String,
    pub build: String,
    pub device: DeviceDescriptor,
}

impl ExportMetadata {
    pub fn new(
        app_version: impl Into<String>,
        build: impl Into<String>,
        device: DeviceDescriptor,
    ) -> Self {
        Self {
            exported_at: Utc::now(),
            app_version: app_version.into(),
            build: build.into(),
            device,
        }
    }
}

/// 내보내기 문서
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub settings: BTreeMap<String, SettingValue>,
    pub health_history: Vec<HealthSnapshot>,
    pub alerts: Vec<Alert>,
    pub recommendations: Vec<Recommendation>,
}

/// 이력/경고/권장 조치 → 내보내기 문서
pub fn export_snapshot(
    metadata: ExportMetadata,
    settings: BTreeMap<String, SettingValue>,
    history: &[HealthSnapshot],
    alerts: &[Alert],
    recommendations: &[Recommendation],
) -> ExportDocument {
    ExportDocument {
        metadata,
        settings,
        health_history: history.to_vec(),
        alerts: alerts.to_vec(),
        recommendations: recommendations.to_vec(),
    }
}

// ============================================================
// 렌더링
// ============================================================

/// 문서를 지정 형식 문자열로 변환
pub fn render(doc: &ExportDocument, format: ExportFormat) -> Result<String, CoreError> {
    match format {
        ExportFormat::Json => to_json(doc),
        ExportFormat::Csv => Ok(to_csv(doc)),
    }
}

pub fn to_json(doc: &ExportDocument) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

const HISTORY_COLUMNS: &[&str] = &[
    "timestamp",
    "score",
    "memory_percent",
    "cpu_percent",
    "battery_percent",
    "storage_percent",
];
const ALERT_COLUMNS: &[&str] = &["timestamp", "type", "title", "message", "severity", "resolved"];
const RECOMMENDATION_COLUMNS: &[&str] =
    &["type", "title", "description", "action", "impact", "completed"];

/// 구역별 CSV
///
/// 구역은 `# 이름` 줄로 시작하고 빈 줄로 끝난다. 각 구역 첫 행은 헤더.
pub fn to_csv(doc: &ExportDocument) -> String {
    let mut out = String::new();

    let metadata_rows = vec![
        vec!["exported_at".to_string(), doc.metadata.exported_at.to_rfc3339()],
        vec!["app_version".to_string(), doc.metadata.app_version.clone()],
        vec!["build".to_string(), doc.metadata.build.clone()],
        vec!["device".to_string(), doc.metadata.device.label()],
    ];
    push_section(&mut out, "metadata", &["key", "value"], &metadata_rows);

    let settings_rows: Vec<Vec<String>> = doc
        .settings
        .iter()
        .map(|(k, v)| vec![k.clone(), setting_to_string(v)])
        .collect();
    push_section(&mut out, "settings", &["key", "value"], &settings_rows);

    let history_rows: Vec<Vec<String>> = doc
        .health_history
        .iter()
        .map(|s| {
            vec![
                s.timestamp.to_rfc3339(),
                s.overall_score.to_string(),
                percent(s.memory.usage_percent()),
                percent(s.cpu.usage_percent),
                percent(s.battery.level * 100.0),
                percent(s.storage.usage_percent()),
            ]
        })
        .collect();
    push_section(&mut out, "health_history", HISTORY_COLUMNS, &history_rows);

    let alert_rows: Vec<Vec<String>> = doc
        .alerts
        .iter()
        .map(|a| {
            vec![
                a.timestamp.to_rfc3339(),
                a.kind.as_str().to_string(),
                a.title.clone(),
                a.message.clone(),
                a.severity.as_str().to_string(),
                a.resolved.to_string(),
            ]
        })
        .collect();
    push_section(&mut out, "alerts", ALERT_COLUMNS, &alert_rows);

    let recommendation_rows: Vec<Vec<String>> = doc
        .recommendations
        .iter()
        .map(|r| {
            vec![
                r.kind.as_str().to_string(),
                r.title.clone(),
                r.description.clone(),
                r.action_label.clone(),
                r.impact.as_str().to_string(),
                r.is_completed.to_string(),
            ]
        })
        .collect();
    push_section(
        &mut out,
        "recommendations",
        RECOMMENDATION_COLUMNS,
        &recommendation_rows,
    );

    out
}

fn push_section(out: &mut String, name: &str, headers: &[&str], rows: &[Vec<String>]) {
    out.push_str("# ");
    out.push_str(name);
    out.push('\n');
    out.push_str(&headers.join(","));
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_csv(c)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out.push('\n');
}

/// CSV 이스케이프 (쉼표, 쌍따옴표, 줄바꿈 포함 시 따옴표로 감쌈)
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn percent(value: f64) -> String {
    format!("{value:.1}")
}

fn setting_to_string(value: &SettingValue) -> String {
    match value {
        SettingValue::Bool(v) => v.to_string(),
        SettingValue::Int(v) => v.to_string(),
        SettingValue::Float(v) => v.to_string(),
        SettingValue::Text(v) => v.clone(),
    }
}

// ============================================================
// 파일 내보내기
// ============================================================

/// 파일 내보내기
#[derive(Debug, Clone)]
pub struct Exporter {
    directory: PathBuf,
}

impl Exporter {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// 문서를 파일로 저장하고 경로 반환
    ///
    /// 임시 파일에 모두 쓴 뒤 최종 이름으로 교체한다. 실패하면 임시 파일은
    /// 삭제되고 `ExportFailed`를 반환한다.
    pub fn export_to_file(
        &self,
        doc: &ExportDocument,
        format: ExportFormat,
    ) -> Result<PathBuf, CoreError> {
        let content = render(doc, format)
            .map_err(|e| CoreError::ExportFailed(format!("렌더링 실패: {e}")))?;

        fs::create_dir_all(&self.directory).map_err(|e| {
            CoreError::ExportFailed(format!(
                "디렉토리 생성 실패: {}: {e}",
                self.directory.display()
            ))
        })?;

        let file_name = format!(
            "pulse_export_{}.{}",
            doc.metadata.exported_at.format("%Y%m%d_%H%M%S"),
            format.extension()
        );
        let target = self.directory.join(file_name);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.directory)
            .map_err(|e| CoreError::ExportFailed(format!("임시 파일 생성 실패: {e}")))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CoreError::ExportFailed(format!("쓰기 실패: {e}")))?;
        tmp.persist(&target).map_err(|e| {
            warn!("내보내기 파일 교체 실패: {}", target.display());
            CoreError::ExportFailed(format!("파일 저장 실패: {}: {}", target.display(), e.error))
        })?;

        info!("내보내기 완료: {}", target.display());
        Ok(target)
    }
}
