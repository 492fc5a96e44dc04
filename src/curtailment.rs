//! 시간별 SMP 이력에서 감발 구간을 찾고 경제성을 요약한다.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::analysis::{compute, AnalysisError, FormulaOverrideMap};
use crate::chart::Dominant;
use crate::conversion::HOURS_PER_DAY;
use crate::model::{
    HourlySmpData, InputParameters, PlantRowInput, PlantRows, MINIMUM_OUTPUT, NOMINAL_OUTPUT, REDUCED_OUTPUT,
};

/// 감발 구간으로 인정하는 최소 연속 시간.
pub const MIN_CURTAILMENT_HOURS: usize = 6;

/// 0 이하는 결측이므로 구간에 포함하지 않는다.
pub fn in_window(price: f64, threshold: f64) -> bool {
    price > 0.0 && price <= threshold
}

/// 하루 안에서 선택된 연속 감발 구간.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurtailmentWindow {
    /// 시작 인덱스 (0 = 1시)
    pub start_index: usize,
    pub prices: Vec<f64>,
    /// 0시 시작이면서 전날 24시 가격도 구간 안이었는지
    pub continues_from_previous_day: bool,
}

impl CurtailmentWindow {
    pub fn hours(&self) -> usize {
        self.prices.len()
    }

    /// 1부터 세는 시작 시각.
    pub fn start_hour(&self) -> usize {
        self.start_index + 1
    }

    /// 1부터 세는 마지막 시각.
    pub fn end_hour(&self) -> usize {
        self.start_index + self.prices.len()
    }

    pub fn average_price(&self) -> f64 {
        if self.prices.is_empty() {
            0.0
        } else {
            self.prices.iter().sum::<f64>() / self.prices.len() as f64
        }
    }
}

/// `min_hours` 이상 이어지는 구간 중 가장 긴 것을 고른다.
///
/// 길이가 같으면 전날에서 이어지는 0시 시작 구간을, 그것도 같으면 먼저 나온 구간을
/// 고른다.
pub fn find_curtailment_window_with(
    hourly_prices: &[f64; 24],
    threshold: f64,
    prev_day_last_hour_price: Option<f64>,
    min_hours: usize,
) -> Option<CurtailmentWindow> {
    let prev_in_window = prev_day_last_hour_price.is_some_and(|p| in_window(p, threshold));

    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut start: Option<usize> = None;
    for (i, price) in hourly_prices.iter().enumerate() {
        match (in_window(*price, threshold), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, hourly_prices.len()));
    }

    let mut best: Option<CurtailmentWindow> = None;
    for (s, e) in runs {
        if e - s < min_hours {
            continue;
        }
        let candidate = CurtailmentWindow {
            start_index: s,
            prices: hourly_prices[s..e].to_vec(),
            continues_from_previous_day: s == 0 && prev_in_window,
        };
        let replace = match &best {
            None => true,
            Some(current) => {
                candidate.hours() > current.hours()
                    || (candidate.hours() == current.hours()
                        && candidate.continues_from_previous_day
                        && !current.continues_from_previous_day)
            }
        };
        if replace {
            best = Some(candidate);
        }
    }
    best
}

pub fn find_curtailment_window(
    hourly_prices: &[f64; 24],
    threshold: f64,
    prev_day_last_hour_price: Option<f64>,
) -> Option<CurtailmentWindow> {
    find_curtailment_window_with(
        hourly_prices,
        threshold,
        prev_day_last_hour_price,
        MIN_CURTAILMENT_HOURS,
    )
}

/// 선택된 구간의 가격들. 해당 구간이 없으면 빈 벡터.
pub fn find_curtailment_periods(
    hourly_prices: &[f64; 24],
    threshold: f64,
    prev_day_last_hour_price: Option<f64>,
) -> Vec<f64> {
    find_curtailment_window(hourly_prices, threshold, prev_day_last_hour_price)
        .map(|w| w.prices)
        .unwrap_or_default()
}

/// 감발 구간 동안 출력별 공헌이익 합계 [백만원].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEconomics {
    pub profit_93: f64,
    pub profit_80: f64,
    pub profit_65: f64,
    /// 정지를 포함해 가장 유리한 운전
    pub best: Dominant,
    /// 최선 운전이 정격 운전보다 나은 금액
    pub gain_over_nominal: f64,
}

/// 구간의 각 시간 SMP 로 출력별 시간당 공헌이익(일 공헌이익/24)을 합산한다.
pub fn window_economics(
    window: &CurtailmentWindow,
    params: &InputParameters,
    rows: &PlantRows,
    overrides: Option<&FormulaOverrideMap>,
) -> Result<WindowEconomics, AnalysisError> {
    let hourly_sum = |output: f64, row: &PlantRowInput| -> Result<f64, AnalysisError> {
        window.prices.iter().try_fold(0.0, |acc, &smp| {
            let r = compute(output, params, row, smp, overrides)?;
            Ok(acc + r.contribution_profit / HOURS_PER_DAY)
        })
    };
    let profit_93 = hourly_sum(NOMINAL_OUTPUT, &rows.mw93)?;
    let profit_80 = hourly_sum(REDUCED_OUTPUT, &rows.mw80)?;
    let profit_65 = hourly_sum(MINIMUM_OUTPUT, &rows.mw65)?;

    let mut best = (Dominant::Output(NOMINAL_OUTPUT), profit_93);
    for candidate in [
        (Dominant::Output(REDUCED_OUTPUT), profit_80),
        (Dominant::Output(MINIMUM_OUTPUT), profit_65),
        (Dominant::Stopped, 0.0),
    ] {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }

    Ok(WindowEconomics {
        profit_93,
        profit_80,
        profit_65,
        best: best.0,
        gain_over_nominal: best.1 - profit_93,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurtailmentDay {
    pub date: NaiveDate,
    pub window: Option<CurtailmentWindow>,
    pub economics: Option<WindowEconomics>,
}

/// 기간 전체 감발 요약.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurtailmentSummary {
    pub threshold: f64,
    pub days: Vec<CurtailmentDay>,
    pub curtailed_days: usize,
    pub total_hours: usize,
    /// 감발 구간 전체 시간의 평균 SMP
    pub average_price: Option<f64>,
    pub total_gain: f64,
}

/// 날짜별로 감발 구간을 찾고 구간 경제성을 합산한다.
///
/// 바로 전날 자료가 있을 때만 그 24시 가격을 연속성 판단에 쓴다.
pub fn summarize(
    data: &HourlySmpData,
    threshold: f64,
    params: &InputParameters,
    rows: &PlantRows,
    overrides: Option<&FormulaOverrideMap>,
) -> Result<CurtailmentSummary, AnalysisError> {
    summarize_with(data, threshold, MIN_CURTAILMENT_HOURS, params, rows, overrides)
}

pub fn summarize_with(
    data: &HourlySmpData,
    threshold: f64,
    min_hours: usize,
    params: &InputParameters,
    rows: &PlantRows,
    overrides: Option<&FormulaOverrideMap>,
) -> Result<CurtailmentSummary, AnalysisError> {
    let mut days = Vec::with_capacity(data.days.len());
    let mut price_sum = 0.0;
    let mut total_hours = 0;
    let mut total_gain = 0.0;

    for (i, day) in data.days.iter().enumerate() {
        let prev_price = i
            .checked_sub(1)
            .map(|j| &data.days[j])
            .filter(|prev| prev.date + Duration::days(1) == day.date)
            .map(|prev| prev.last_hour_price());
        let window = find_curtailment_window_with(&day.hourly_prices, threshold, prev_price, min_hours);
        let economics = match &window {
            Some(w) => {
                price_sum += w.prices.iter().sum::<f64>();
                total_hours += w.hours();
                let econ = window_economics(w, params, rows, overrides)?;
                total_gain += econ.gain_over_nominal;
                Some(econ)
            }
            None => None,
        };
        days.push(CurtailmentDay {
            date: day.date,
            window,
            economics,
        });
    }

    let curtailed_days = days.iter().filter(|d| d.window.is_some()).count();
    debug!(days = days.len(), curtailed_days, total_hours, "감발 요약");
    Ok(CurtailmentSummary {
        threshold,
        days,
        curtailed_days,
        total_hours,
        average_price: (total_hours > 0).then(|| price_sum / total_hours as f64),
        total_gain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_with(ranges: &[(usize, usize, f64)]) -> [f64; 24] {
        let mut prices = [150.0; 24];
        for &(s, e, p) in ranges {
            for slot in &mut prices[s..e] {
                *slot = p;
            }
        }
        prices
    }

    #[test]
    fn short_runs_are_ignored() {
        let prices = day_with(&[(2, 7, 40.0)]);
        assert!(find_curtailment_periods(&prices, 50.0, None).is_empty());
    }

    #[test]
    fn longest_run_wins() {
        let prices = day_with(&[(0, 6, 40.0), (10, 18, 30.0)]);
        let w = find_curtailment_window(&prices, 50.0, None).unwrap();
        assert_eq!(w.start_index, 10);
        assert_eq!(w.hours(), 8);
        assert_eq!((w.start_hour(), w.end_hour()), (11, 18));
    }

    #[test]
    fn missing_hours_break_runs() {
        let mut prices = day_with(&[(4, 16, 40.0)]);
        prices[9] = 0.0;
        let w = find_curtailment_window(&prices, 50.0, None).unwrap();
        assert_eq!(w.start_index, 10);
        assert_eq!(w.hours(), 6);
    }

    #[test]
    fn tie_prefers_run_continuing_from_previous_day() {
        let prices = day_with(&[(0, 6, 40.0), (12, 18, 30.0)]);
        let w = find_curtailment_window(&prices, 50.0, Some(45.0)).unwrap();
        assert_eq!(w.start_index, 0);
        assert!(w.continues_from_previous_day);
    }

    #[test]
    fn tie_without_continuation_keeps_first() {
        let prices = day_with(&[(0, 6, 40.0), (12, 18, 30.0)]);
        let w = find_curtailment_window(&prices, 50.0, Some(120.0)).unwrap();
        assert_eq!(w.start_index, 0);
        assert!(!w.continues_from_previous_day);
    }

    #[test]
    fn run_until_midnight_is_closed() {
        let prices = day_with(&[(16, 24, 20.0)]);
        assert_eq!(find_curtailment_periods(&prices, 50.0, None), vec![20.0; 8]);
    }

    #[test]
    fn economics_prefers_stopping_at_very_low_prices() {
        let window = CurtailmentWindow {
            start_index: 0,
            prices: vec![5.0; 6],
            continues_from_previous_day: false,
        };
        let econ = window_economics(
            &window,
            &InputParameters::default(),
            &PlantRows::default(),
            None,
        )
        .unwrap();
        assert_eq!(econ.best, Dominant::Stopped);
        assert!((econ.gain_over_nominal + econ.profit_93).abs() < 1e-9);
    }
}
