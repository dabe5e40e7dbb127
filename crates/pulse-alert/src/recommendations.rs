//! 권장 조치 생성.
//!
//! 스냅샷 기준으로 매번 전체 목록을 새로 만든다.

use pulse_core::models::alert::{Impact, Recommendation, RecommendationKind};
use pulse_core::models::health::HealthSnapshot;

/// 캐시 정리 권장 시작 (%)
const STORAGE_CLEANUP_PERCENT: f64 = 80.0;
/// 배터리 최적화 권장 시작 (0~1)
const BATTERY_OPTIMIZE_LEVEL: f64 = 0.50;

/// 스냅샷 → 권장 조치 목록
pub fn recommend(snapshot: &HealthSnapshot) -> Vec<Recommendation> {
    let mut list = Vec::new();

    if snapshot.storage.usage_percent() > STORAGE_CLEANUP_PERCENT {
        list.push(Recommendation::new(
            RecommendationKind::ClearCache,
            "캐시 정리",
            "앱 캐시를 정리해 저장공간을 확보하세요",
            "캐시 정리",
            Impact::Medium,
        ));
        list.push(Recommendation::new(
            RecommendationKind::ReviewLargeFiles,
            "대용량 파일 검토",
            "사용하지 않는 대용량 파일과 미디어를 정리하세요",
            "파일 검토",
            Impact::High,
        ));
    }

    if snapshot.battery.level < BATTERY_OPTIMIZE_LEVEL && !snapshot.battery.is_charging {
        list.push(Recommendation::new(
            RecommendationKind::OptimizeBattery,
            "배터리 최적화",
            "저전력 모드를 켜고 화면 밝기를 낮추세요",
            "최적화",
            Impact::Medium,
        ));
    }

    if snapshot.network.is_slow {
        list.push(Recommendation::new(
            RecommendationKind::RunSpeedTest,
            "속도 측정",
            "네트워크 속도를 측정해 연결 상태를 확인하세요",
            "측정 시작",
            Impact::Low,
        ));
    }

    if snapshot.memory.is_high {
        list.push(Recommendation::new(
            RecommendationKind::CloseBackgroundApps,
            "백그라운드 앱 종료",
            "사용하지 않는 앱을 종료해 메모리를 확보하세요",
            "앱 관리",
            Impact::Medium,
        ));
    }

    list.push(Recommendation::new(
        RecommendationKind::CheckPermissions,
        "앱 권한 점검",
        "위치, 카메라 등 민감한 권한을 가진 앱을 확인하세요",
        "권한 확인",
        Impact::Low,
    ));
    list.push(Recommendation::new(
        RecommendationKind::UpdateApps,
        "앱 업데이트",
        "최신 버전으로 업데이트해 보안과 성능을 개선하세요",
        "업데이트 확인",
        Impact::Low,
    ));

    list
}
