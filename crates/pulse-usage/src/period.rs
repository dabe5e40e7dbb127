//! 기간 계산과 집계.
//!
//! 상태 없는 함수 모음. 달력 경계는 호출자가 넘긴 시간대 기준으로 계산하고
//! 결과는 UTC로 저장한다. 요약은 `timestamp`가 `[start, end)` 안에 있으면 포함.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use pulse_core::error::CoreError;
use pulse_core::models::period::{Period, PeriodType};
use pulse_core::models::usage::{AppUsage, ChartPoint, UsageStatistics, UsageSummary};

/// 기간 유형 → `[start, end)` 구간
///
/// 주는 월요일 시작. `LastMonth`는 직전 달력 월 전체.
/// `Custom`은 경계가 필요하므로 [`Period::custom`]을 사용해야 한다.
pub fn resolve_period<Tz: TimeZone>(
    period_type: PeriodType,
    now: &DateTime<Tz>,
) -> Result<Period, CoreError> {
    let tz = now.timezone();
    let today = now.date_naive();

    let (start_date, end_date) = match period_type {
        PeriodType::Today => (today, next_day(today)?),
        PeriodType::ThisWeek => {
            let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
            (monday, monday + Duration::days(7))
        }
        PeriodType::ThisMonth => {
            let first = first_of_month(today.year(), today.month())?;
            (first, first_of_next_month(first)?)
        }
        PeriodType::LastMonth => {
            let this_first = first_of_month(today.year(), today.month())?;
            (first_of_prev_month(this_first)?, this_first)
        }
        PeriodType::Custom => {
            return Err(CoreError::invalid(
                "period_type",
                "Custom 기간은 Period::custom(start, end)로 생성해야 합니다",
            ));
        }
    };

    Ok(Period {
        start: local_midnight(&tz, start_date)?,
        end: local_midnight(&tz, end_date)?,
        period_type,
    })
}

fn next_day(date: NaiveDate) -> Result<NaiveDate, CoreError> {
    date.succ_opt()
        .ok_or_else(|| CoreError::invalid("date", format!("다음 날 계산 불가: {date}")))
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, CoreError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::invalid("date", format!("잘못된 연월: {year}-{month}")))
}

fn first_of_next_month(first: NaiveDate) -> Result<NaiveDate, CoreError> {
    if first.month() == 12 {
        first_of_month(first.year() + 1, 1)
    } else {
        first_of_month(first.year(), first.month() + 1)
    }
}

fn first_of_prev_month(first: NaiveDate) -> Result<NaiveDate, CoreError> {
    if first.month() == 1 {
        first_of_month(first.year() - 1, 12)
    } else {
        first_of_month(first.year(), first.month() - 1)
    }
}

/// 해당 날짜의 현지 자정 (자정이 DST 공백이면 1시간 뒤)
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<DateTime<Utc>, CoreError> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| CoreError::invalid("date", format!("현지 자정 계산 불가: {date}")))
}

/// 기간에 속한 요약만 추출 (입력 순서 유지)
pub fn filter<'a, I>(summaries: I, period: &Period) -> Vec<&'a UsageSummary>
where
    I: IntoIterator<Item = &'a UsageSummary>,
{
    summaries
        .into_iter()
        .filter(|s| period.contains(s.timestamp))
        .collect()
}

/// 앱 목록을 bundle id 기준으로 병합 (처음 등장 순서 유지)
pub fn merge_apps<'a, I>(apps: I) -> Vec<AppUsage>
where
    I: IntoIterator<Item = &'a AppUsage>,
{
    let mut merged: Vec<AppUsage> = Vec::new();
    for app in apps {
        match merged.iter_mut().find(|m| m.bundle_id == app.bundle_id) {
            Some(existing) => existing.merge(app),
            None => merged.push(app.clone()),
        }
    }
    merged
}

/// 기간 합계 요약
///
/// 합계와 앱별 바이트는 기간 내 요약들의 합이다. `timestamp`는 마지막 요약 시각,
/// 요약이 없으면 기간 시작.
pub fn aggregate<'a, I>(summaries: I, period: &Period) -> UsageSummary
where
    I: IntoIterator<Item = &'a UsageSummary>,
{
    let matching = filter(summaries, period);
    let timestamp = matching
        .iter()
        .map(|s| s.timestamp)
        .max()
        .unwrap_or(period.start);
    let apps = merge_apps(matching.iter().flat_map(|s| s.apps.iter()));

    let (cellular, wifi) = matching.iter().fold((0u64, 0u64), |(c, w), s| {
        (
            c.saturating_add(s.total_cellular_bytes),
            w.saturating_add(s.total_wifi_bytes),
        )
    });

    UsageSummary {
        period: *period,
        total_cellular_bytes: cellular,
        total_wifi_bytes: wifi,
        apps,
        timestamp,
    }
}

/// 기간 통계
///
/// 평균 = 기간 내 요약 total 합 / 요약 개수. 최댓값이 같으면 먼저 나온 요약의 시각.
pub fn statistics<'a, I>(summaries: I, period: &Period) -> UsageStatistics
where
    I: IntoIterator<Item = &'a UsageSummary> + Clone,
{
    let matching = filter(summaries.clone(), period);
    let sample_count = matching.len();

    let sum: u64 = matching
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.total_bytes()));
    let average_daily_bytes = if sample_count == 0 {
        0
    } else {
        sum / sample_count as u64
    };

    let mut peak_bytes = 0u64;
    let mut peak_date = None;
    for summary in &matching {
        let total = summary.total_bytes();
        if peak_date.is_none() || total > peak_bytes {
            peak_bytes = total;
            peak_date = Some(summary.timestamp);
        }
    }

    // 동률이면 먼저 나온 앱
    let merged = aggregate(summaries, period);
    let most_used = merged.apps.iter().rev().max_by_key(|a| a.total_bytes());
    let least_used = merged.apps.iter().min_by_key(|a| a.total_bytes());

    UsageStatistics {
        period: *period,
        average_daily_bytes,
        peak_bytes,
        peak_date,
        most_used: most_used.cloned(),
        least_used: least_used.cloned(),
        sample_count,
    }
}

/// 차트 데이터 (시각 오름차순, 요약당 한 점)
pub fn chart_data<'a, I>(summaries: I, period: &Period) -> Vec<ChartPoint>
where
    I: IntoIterator<Item = &'a UsageSummary>,
{
    let mut points: Vec<ChartPoint> = filter(summaries, period)
        .into_iter()
        .map(|s| ChartPoint {
            timestamp: s.timestamp,
            cellular: s.total_cellular_bytes,
            wifi: s.total_wifi_bytes,
            total: s.total_bytes(),
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}
