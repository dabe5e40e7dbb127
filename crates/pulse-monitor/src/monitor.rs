//! 주기 헬스 모니터.
//!
//! `Stopped → Running → Stopped` 상태 머신. 틱마다 스냅샷을 만들어
//! `watch` 채널로 교체 게시하고, 등록 순서대로 구독자를 호출한다.
//! 정기 틱과 수동 재샘플링은 하나의 게이트로 직렬화된다 (single-flight).

use parking_lot::RwLock;
use pulse_core::config::AppConfig;
use pulse_core::error::CoreError;
use pulse_core::models::health::{ConnectionType, HealthSnapshot};
use pulse_core::ports::probe::MetricsProbe;
use pulse_core::ports::speed::{SpeedTester, Throughput};
use pulse_core::ports::subscriber::SnapshotSubscriber;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::builder::HealthSnapshotBuilder;

/// 모니터 동작 옵션
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    /// 샘플링 주기
    pub sample_interval: Duration,
    /// 속도 측정 타임아웃
    pub speed_test_timeout: Duration,
}

impl MonitorOptions {
    /// 앱 설정에서 추출
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            sample_interval: config.sample_interval(),
            speed_test_timeout: config.speed_test_timeout(),
        }
    }

    /// 주기와 타임아웃은 0보다 커야 한다
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.sample_interval.is_zero() {
            return Err(CoreError::invalid("sample_interval", "0보다 커야 합니다"));
        }
        if self.speed_test_timeout.is_zero() {
            return Err(CoreError::invalid("speed_test_timeout", "0보다 커야 합니다"));
        }
        Ok(())
    }
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default_config())
    }
}

struct LoopHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

struct MonitorInner {
    probe: Arc<dyn MetricsProbe>,
    builder: HealthSnapshotBuilder,
    speed_tester: Option<Arc<dyn SpeedTester>>,
    options: MonitorOptions,
    current_tx: watch::Sender<Option<Arc<HealthSnapshot>>>,
    subscribers: RwLock<Vec<Arc<dyn SnapshotSubscriber>>>,
    /// 틱 직렬화 게이트
    tick_gate: Mutex<()>,
    running: AtomicBool,
    /// 마지막 속도 측정 결과
    throughput: RwLock<Option<Throughput>>,
}

impl MonitorInner {
    /// 스냅샷 1회 생성 및 게시
    async fn tick(&self) -> Option<Arc<HealthSnapshot>> {
        let _gate = self.tick_gate.lock().await;
        if !self.running.load(Ordering::Acquire) {
            return None;
        }

        let throughput = *self.throughput.read();
        let snapshot = Arc::new(self.builder.build(self.probe.as_ref(), throughput).await);

        // 빌드 중 정지되었으면 게시하지 않음
        if !self.running.load(Ordering::Acquire) {
            debug!("정지 중 생성된 스냅샷 폐기");
            return None;
        }

        self.current_tx.send_replace(Some(Arc::clone(&snapshot)));
        debug!(
            "스냅샷 게시: 점수 {} ({})",
            snapshot.overall_score,
            snapshot.health_status.label()
        );

        let subscribers = self.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber.on_snapshot(Arc::clone(&snapshot)).await;
        }

        Some(snapshot)
    }

    fn network_state(&self) -> (ConnectionType, bool) {
        match self.current_tx.borrow().as_ref() {
            Some(s) => (s.network.connection_type, s.network.is_connected),
            None => (ConnectionType::Unknown, true),
        }
    }
}

/// 주기 헬스 모니터
pub struct MetricsMonitor {
    inner: Arc<MonitorInner>,
    handle: Mutex<Option<LoopHandle>>,
}

impl MetricsMonitor {
    /// 새 모니터 생성 (정지 상태)
    pub fn new(
        probe: Arc<dyn MetricsProbe>,
        speed_tester: Option<Arc<dyn SpeedTester>>,
        options: MonitorOptions,
    ) -> Self {
        Self::with_builder(probe, speed_tester, options, HealthSnapshotBuilder::new())
    }

    /// 스냅샷 생성기 지정
    pub fn with_builder(
        probe: Arc<dyn MetricsProbe>,
        speed_tester: Option<Arc<dyn SpeedTester>>,
        options: MonitorOptions,
        builder: HealthSnapshotBuilder,
    ) -> Self {
        let (current_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(MonitorInner {
                probe,
                builder,
                speed_tester,
                options,
                current_tx,
                subscribers: RwLock::new(Vec::new()),
                tick_gate: Mutex::new(()),
                running: AtomicBool::new(false),
                throughput: RwLock::new(None),
            }),
            handle: Mutex::new(None),
        }
    }

    /// 구독자 등록 (등록 순서대로 호출)
    pub fn add_subscriber(&self, subscriber: Arc<dyn SnapshotSubscriber>) {
        debug!("스냅샷 구독자 등록: {}", subscriber.name());
        self.inner.subscribers.write().push(subscriber);
    }

    /// 모니터링 시작
    ///
    /// 이미 실행 중이면 아무것도 하지 않는다. 즉시 1회 샘플링 후
    /// `sample_interval`마다 틱을 예약한다. 옵션이 잘못되면 시작하지 않고
    /// `InvalidArgument`를 반환한다.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.inner.options.validate()?;

        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            debug!("모니터가 이미 실행 중");
            return Ok(());
        }

        self.inner.running.store(true, Ordering::Release);
        self.inner.tick().await;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let period = inner.options.sample_interval;

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                    _ = interval.tick() => {
                        inner.tick().await;
                    }
                }
            }
            debug!("모니터 루프 종료");
        });

        *handle = Some(LoopHandle { shutdown_tx, join });
        info!("헬스 모니터 시작: 주기 {}ms", period.as_millis());
        Ok(())
    }

    /// 모니터링 정지
    ///
    /// 여러 번 호출해도 안전하다. 진행 중인 틱이 끝날 때까지 기다린다.
    pub async fn stop(&self) {
        let mut handle = self.handle.lock().await;
        let Some(LoopHandle { shutdown_tx, join }) = handle.take() else {
            return;
        };

        self.inner.running.store(false, Ordering::Release);
        let _ = shutdown_tx.send(true);
        if let Err(e) = join.await {
            warn!("모니터 루프 종료 실패: {e}");
        }
        // 수동 재샘플링이 진행 중이면 마저 끝나길 기다림
        drop(self.inner.tick_gate.lock().await);
        info!("헬스 모니터 정지");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// 즉시 재샘플링 (정지 상태면 무시)
    pub async fn request_resample(&self) -> Option<Arc<HealthSnapshot>> {
        if !self.is_running() {
            return None;
        }
        self.inner.tick().await
    }

    /// 네트워크 상태 변경 콜백
    ///
    /// 이전 속도 측정값을 버리고 재샘플링한다.
    pub async fn on_network_change(&self) -> Option<Arc<HealthSnapshot>> {
        debug!("네트워크 변경 감지");
        *self.inner.throughput.write() = None;
        self.request_resample().await
    }

    /// 현재 게시된 스냅샷
    pub fn current(&self) -> Option<Arc<HealthSnapshot>> {
        self.inner.current_tx.borrow().clone()
    }

    /// 게시 스냅샷 수신기
    pub fn watch(&self) -> watch::Receiver<Option<Arc<HealthSnapshot>>> {
        self.inner.current_tx.subscribe()
    }

    /// 네트워크 속도 측정
    ///
    /// 타임아웃 또는 실패 시 마지막 측정값이나 연결 유형별 추정치를 돌려준다.
    pub async fn run_speed_test(&self) -> Throughput {
        let (connection_type, is_connected) = self.inner.network_state();
        let fallback = (*self.inner.throughput.read())
            .unwrap_or_else(|| Throughput::nominal(connection_type, is_connected));

        let Some(tester) = self.inner.speed_tester.as_ref() else {
            return fallback;
        };

        let timeout = self.inner.options.speed_test_timeout;
        let measured = tokio::time::timeout(timeout, tester.measure(connection_type))
            .await
            .unwrap_or_else(|_| {
                Err(CoreError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            });

        match measured {
            Ok(throughput) => {
                *self.inner.throughput.write() = Some(throughput);
                info!(
                    "속도 측정: ↓{:.1} ↑{:.1} Mbps",
                    throughput.download_mbps, throughput.upload_mbps
                );
                throughput
            }
            Err(e) => {
                warn!("속도 측정 실패, 추정치 사용: {e}");
                fallback
            }
        }
    }
}
