//! # pulse-app
//!
//! PULSE 바이너리 진입점.
//! DI 컨테이너 역할, 라이프사이클 관리, 모니터/추적기 오케스트레이션.

mod event_bus;
mod lifecycle;
mod notification_manager;
mod notifier;

use anyhow::{anyhow, Result};
use clap::Parser;
use directories::ProjectDirs;
use pulse_alert::{AlertEngine, StaticUpdateChecker};
use pulse_core::config::AppConfig;
use pulse_core::config_manager::{ConfigManager, CONFIG_FILE_NAME};
use pulse_core::models::period::PeriodType;
use pulse_core::models::usage::{AlertThreshold, LimitType, ThresholdLevel, UsageLimit};
use pulse_core::ports::notifier::Notifier;
use pulse_core::ports::settings::{SettingsStore, UserSettings};
use pulse_monitor::{
    HealthHistory, MetricsMonitor, MonitorOptions, SimulatedSpeedTester, SysInfoProbe,
};
use pulse_storage::export::DeviceDescriptor;
use pulse_storage::settings::SETTINGS_FILE_NAME;
use pulse_storage::{export_snapshot, ExportFormat, ExportMetadata, Exporter, JsonSettingsStore};
use pulse_usage::{demo_apps, SyntheticUsageSource, TrackerOptions, UsageTracker};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::event_bus::{AppEvent, EventBus};
use crate::lifecycle::LifecycleManager;
use crate::notification_manager::NotificationManager;
use crate::notifier::LogNotifier;

/// PULSE 기기 상태 모니터
///
/// 메모리/CPU/배터리/저장공간/네트워크 상태를 주기적으로 점검하고
/// 경고와 데이터 사용량을 추적한다.
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 데이터 저장 경로 (사용자 설정, 내보내기)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 헬스 샘플링 주기 (밀리초)
    #[arg(long)]
    sample_interval_ms: Option<u64>,

    /// 사용량 틱 주기 (밀리초)
    #[arg(long)]
    usage_tick_ms: Option<u64>,

    /// 월간 셀룰러 한도 (MB, 75%/90% 임계값)
    #[arg(long)]
    cellular_limit_mb: Option<u64>,

    /// 종료 시 내보내기 형식 (json, csv)
    #[arg(long)]
    export: Option<ExportFormat>,

    /// 1회 샘플링 후 종료
    #[arg(long)]
    once: bool,
}

/// 플랫폼별 경로
///
/// - macOS: `~/Library/Application Support/com.pulse.pulse/`
/// - Windows: `%APPDATA%\pulse\pulse\`
/// - Linux: `~/.config/pulse/` (설정), `~/.local/share/pulse/` (데이터)
struct AppPaths {
    config_file: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    fn resolve(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Self {
        let dirs = ProjectDirs::from("com", "pulse", "pulse");
        let data_dir = data_dir
            .or_else(|| dirs.as_ref().map(|d| d.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("./pulse-data"));
        let config_file = config
            .or_else(|| dirs.as_ref().map(|d| d.config_dir().join(CONFIG_FILE_NAME)))
            .unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
        Self {
            config_file,
            data_dir,
        }
    }
}

/// 설정 우선순위: CLI > 사용자 설정 > 설정 파일
fn effective_config(base: AppConfig, args: &Args, settings: &UserSettings) -> Result<AppConfig> {
    let mut config = base;
    if let Some(interval) = settings.refresh_interval() {
        config.monitor.sample_interval_ms = interval.as_millis() as u64;
    }
    if let Some(ms) = args.sample_interval_ms {
        config.monitor.sample_interval_ms = ms;
    }
    if let Some(ms) = args.usage_tick_ms {
        config.usage.tick_interval_ms = ms;
    }
    config
        .validate()
        .map_err(|e| anyhow!("설정 검증 실패: {e}"))?;
    Ok(config)
}

/// 현재 실행 환경 기기 정보
fn device_descriptor() -> DeviceDescriptor {
    DeviceDescriptor {
        os_version: sysinfo::System::long_os_version(),
        host_name: sysinfo::System::host_name(),
        ..DeviceDescriptor::current()
    }
}

fn cellular_limit(megabytes: u64) -> Result<UsageLimit> {
    let thresholds = vec![
        AlertThreshold::new(75.0, ThresholdLevel::Warning)?,
        AlertThreshold::new(90.0, ThresholdLevel::Critical)?,
    ];
    Ok(UsageLimit::new(
        LimitType::Cellular,
        megabytes.saturating_mul(1024 * 1024),
        PeriodType::ThisMonth,
        thresholds,
    )?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 로깅 초기화
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("PULSE 시작 (v{})", env!("CARGO_PKG_VERSION"));

    // ── 설정 ──
    let paths = AppPaths::resolve(args.config.clone(), args.data_dir.clone());
    let config_manager = ConfigManager::with_path(paths.config_file.clone())
        .map_err(|e| anyhow!("설정 로드 실패: {e}"))?;
    info!("설정 파일: {}", config_manager.config_path().display());

    let settings_store = Arc::new(JsonSettingsStore::open(
        paths.data_dir.join(SETTINGS_FILE_NAME),
    )?);
    let user_settings = UserSettings::new(settings_store.clone());
    let config = effective_config(config_manager.get(), &args, &user_settings)?;

    // ── 어댑터 생성 (DI 와이어링) ──
    // 1. 알림
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let notification_manager = Arc::new(
        NotificationManager::new(config.notification.clone(), notifier)
            .with_settings(user_settings.clone()),
    );

    // 2. 이벤트 버스
    let event_bus = Arc::new(EventBus::new(128));

    // 3. 경고 엔진
    let alert_engine = Arc::new(
        AlertEngine::new()
            .with_update_checker(Arc::new(StaticUpdateChecker::new(None)))
            .with_sink(notification_manager.clone())
            .with_sink(event_bus.clone()),
    );

    // 4. 헬스 모니터 (구독 순서: 경고 엔진 → 이력 → 이벤트 버스)
    let health_history = Arc::new(HealthHistory::new(config.monitor.history_capacity));
    let monitor = MetricsMonitor::new(
        Arc::new(SysInfoProbe::new()),
        Some(Arc::new(SimulatedSpeedTester::new())),
        MonitorOptions::from_config(&config),
    );
    monitor.add_subscriber(alert_engine.clone());
    monitor.add_subscriber(health_history.clone());
    monitor.add_subscriber(event_bus.clone());

    // 5. 사용량 추적기
    let tracker = UsageTracker::new(
        Arc::new(SyntheticUsageSource::default()),
        demo_apps(),
        TrackerOptions::from_config(&config),
    );
    tracker.add_sink(alert_engine.clone());
    tracker.add_sink(notification_manager.clone());
    tracker.add_sink(event_bus.clone());
    if let Some(mb) = args.cellular_limit_mb {
        let id = tracker.add_limit(cellular_limit(mb)?)?;
        info!("셀룰러 한도 등록: {mb}MB ({id})");
    }

    // 6. 라이프사이클
    let lifecycle = Arc::new(LifecycleManager::new());

    // ── 태스크 시작 ──
    let mut events = event_bus.subscribe();
    let mut shutdown_rx = lifecycle.subscribe();
    let event_logger = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                event = events.recv() => match event {
                    Ok(AppEvent::SnapshotPublished(s)) => {
                        info!(
                            "헬스 점수 {} ({}) 메모리 {:.1}% CPU {:.1}%",
                            s.overall_score,
                            s.health_status.label(),
                            s.memory.usage_percent(),
                            s.cpu.usage_percent
                        );
                    }
                    Ok(AppEvent::AlertRaised(a)) => {
                        info!("경고: [{}] {}", a.severity.as_str(), a.title);
                    }
                    Ok(AppEvent::UsageAlertRaised(a)) => {
                        info!(
                            "사용량 경고: {} {:.1}%",
                            a.limit_type.as_str(),
                            a.usage_percentage()
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("이벤트 {n}개 누락");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });

    monitor.start().await?;
    if args.once {
        let throughput = monitor.run_speed_test().await;
        info!(
            "속도 측정 결과: ↓{:.1} ↑{:.1} Mbps",
            throughput.download_mbps, throughput.upload_mbps
        );
        if let Some(snapshot) = monitor.request_resample().await {
            info!("최종 헬스 점수: {}", snapshot.overall_score);
        }
        lifecycle.shutdown();
    } else {
        tracker.start().await?;
        info!("PULSE 실행 중 (Ctrl+C로 종료)");
        lifecycle.wait_for_signal().await;
    }

    // ── 종료 ──
    monitor.stop().await;
    tracker.stop().await;
    if let Err(e) = event_logger.await {
        warn!("이벤트 로거 종료 실패: {e}");
    }

    for alert in alert_engine.unresolved_alerts() {
        info!("미해결 경고: [{}] {}", alert.severity.as_str(), alert.title);
    }
    for rec in alert_engine.recommendations() {
        info!("권장 조치: {} ({})", rec.title, rec.impact.as_str());
    }
    if let Some(summary) = tracker.current_summary() {
        info!(
            "오늘 사용량: 셀룰러 {}B, 와이파이 {}B",
            summary.total_cellular_bytes, summary.total_wifi_bytes
        );
    }
    info!("발송 알림: {}건", notification_manager.sent_count().await);

    if let Some(format) = args.export {
        let directory = config
            .export
            .directory
            .clone()
            .unwrap_or_else(|| paths.data_dir.join("exports"));
        let history: Vec<_> = health_history
            .snapshots()
            .iter()
            .map(|s| (**s).clone())
            .collect();
        let build = if cfg!(debug_assertions) { "debug" } else { "release" };
        let doc = export_snapshot(
            ExportMetadata::new(env!("CARGO_PKG_VERSION"), build, device_descriptor()),
            settings_store.snapshot(),
            &history,
            &alert_engine.alerts(),
            &alert_engine.recommendations(),
        );
        let path = Exporter::new(directory).export_to_file(&doc, format)?;
        println!("내보내기: {}", path.display());
    }

    info!("PULSE 종료");
    Ok(())
}
