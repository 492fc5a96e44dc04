//! SMP-공헌이익 차트용 곡선, 교차점, 우위 구간.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{compute, AnalysisError, FormulaOverrideMap};
use crate::interpolation::interpolate;
use crate::model::{InputParameters, PlantRows};

/// 두 선분이 평행하다고 보는 행렬식 크기.
const PARALLEL_EPS: f64 = 1e-4;

/// 격자점 수 한도. 출력마다 점 하나당 엔진을 한 번 돌린다.
pub const MAX_GRID_POINTS: usize = 100_000;

/// SMP 축 격자. 기본값은 0~150 원/kWh, 1원 간격.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmpGrid {
    pub max_smp: f64,
    pub step: f64,
}

impl Default for SmpGrid {
    fn default() -> Self {
        Self {
            max_smp: 150.0,
            step: 1.0,
        }
    }
}

impl SmpGrid {
    /// 격자를 만들 수 있는 설정인지 검사한다.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.max_smp.is_finite() || self.max_smp < 0.0 {
            return Err(AnalysisError::DegenerateInput(format!(
                "SMP 축 최대값이 올바르지 않음: {}",
                self.max_smp
            )));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(AnalysisError::DegenerateInput(format!(
                "SMP 격자 간격이 올바르지 않음: {}",
                self.step
            )));
        }
        if self.max_smp / self.step > MAX_GRID_POINTS as f64 {
            return Err(AnalysisError::DegenerateInput(format!(
                "SMP 격자점이 {MAX_GRID_POINTS}개를 넘음 (최대값 {}, 간격 {})",
                self.max_smp, self.step
            )));
        }
        Ok(())
    }

    /// 0부터 `max_smp` 까지의 격자점. 마지막 점은 항상 `max_smp` 이다.
    pub fn points(&self) -> Result<Vec<f64>, AnalysisError> {
        self.validate()?;
        if self.max_smp == 0.0 {
            return Ok(vec![0.0]);
        }
        let count = (self.max_smp / self.step).floor() as usize;
        let mut out: Vec<f64> = (0..=count).map(|i| i as f64 * self.step).collect();
        match out.last() {
            Some(last) if (self.max_smp - last).abs() < 1e-9 => {
                if let Some(slot) = out.last_mut() {
                    *slot = self.max_smp;
                }
            }
            _ => out.push(self.max_smp),
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub smp: f64,
    pub profit: f64,
}

/// 출력 하나의 SMP별 공헌이익 곡선.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitCurve {
    pub output: f64,
    pub points: Vec<CurvePoint>,
}

/// 선택한 출력마다 격자 전체의 공헌이익을 계산한다.
pub fn sample_curves(
    outputs: &[f64],
    params: &InputParameters,
    rows: &PlantRows,
    grid: &SmpGrid,
    overrides: Option<&FormulaOverrideMap>,
) -> Result<Vec<ProfitCurve>, AnalysisError> {
    let smps = grid.points()?;
    outputs
        .iter()
        .map(|&output| {
            let row = interpolate(output, rows);
            let points = smps
                .iter()
                .map(|&smp| {
                    let r = compute(output, params, &row, smp, overrides)?;
                    Ok(CurvePoint {
                        smp,
                        profit: r.contribution_profit,
                    })
                })
                .collect::<Result<Vec<_>, AnalysisError>>()?;
            Ok(ProfitCurve { output, points })
        })
        .collect()
}

/// 두 곡선의 교차점.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intersection {
    pub output_a: f64,
    pub output_b: f64,
    pub smp: f64,
    pub profit: f64,
}

fn segment_intersection(
    (x1, y1): (f64, f64),
    (x2, y2): (f64, f64),
    (x3, y3): (f64, f64),
    (x4, y4): (f64, f64),
) -> Option<(f64, f64)> {
    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
    let u = -((x1 - x2) * (y1 - y3) - (y1 - y2) * (x1 - x3)) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((x1 + t * (x2 - x1), y1 + t * (y2 - y1)))
    } else {
        None
    }
}

/// 곡선 쌍마다 같은 격자 구간끼리 선분 교차를 검사해 처음 찾은 교차점만 돌려준다.
///
/// 쌍은 입력 순서 (i < j) 로, 구간은 SMP 오름차순으로 훑는다.
pub fn find_intersections(curves: &[ProfitCurve]) -> Vec<Intersection> {
    let mut out = Vec::new();
    for (i, a) in curves.iter().enumerate() {
        for b in &curves[i + 1..] {
            let segments = a.points.len().min(b.points.len()).saturating_sub(1);
            let hit = (0..segments).find_map(|k| {
                segment_intersection(
                    (a.points[k].smp, a.points[k].profit),
                    (a.points[k + 1].smp, a.points[k + 1].profit),
                    (b.points[k].smp, b.points[k].profit),
                    (b.points[k + 1].smp, b.points[k + 1].profit),
                )
            });
            if let Some((smp, profit)) = hit {
                out.push(Intersection {
                    output_a: a.output,
                    output_b: b.output,
                    smp,
                    profit,
                });
            }
        }
    }
    out
}

/// 구간에서 가장 유리한 운전.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "output", rename_all = "camelCase")]
pub enum Dominant {
    Output(f64),
    /// 어느 출력도 이익이 나지 않아 정지하는 편이 나음
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DominanceZone {
    pub start: f64,
    pub end: f64,
    pub dominant: Dominant,
}

impl DominanceZone {
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// 이익이 양수인 출력 중 최대 이익 출력. 동률이면 먼저 나온 곡선을 고른다.
fn dominant_at(curves: &[ProfitCurve], index: usize) -> Dominant {
    let mut best: Option<(f64, f64)> = None;
    for curve in curves {
        let profit = curve.points[index].profit;
        if profit <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, p)| profit > p) {
            best = Some((curve.output, profit));
        }
    }
    best.map_or(Dominant::Stopped, |(output, _)| Dominant::Output(output))
}

/// SMP 축을 우위 출력이 같은 연속 구간으로 나눈다.
///
/// 모든 출력의 이익이 0 이하인 마지막 격자점까지는 정지 구간이다. 구간은 빈틈
/// 없이 이어지며 전체 폭의 합은 격자 범위와 같다. 선택한 출력이 없으면 `smps`
/// 전체가 정지 구간 하나가 된다.
pub fn dominance_zones(curves: &[ProfitCurve], smps: &[f64]) -> Vec<DominanceZone> {
    let n = curves
        .iter()
        .map(|c| c.points.len())
        .min()
        .unwrap_or(smps.len())
        .min(smps.len());
    if n == 0 {
        return Vec::new();
    }

    let stopped_until = (0..n)
        .rev()
        .find(|&i| curves.iter().all(|c| c.points[i].profit <= 0.0));

    let labels: Vec<Dominant> = (0..n)
        .map(|i| match stopped_until {
            Some(last) if i <= last => Dominant::Stopped,
            _ => dominant_at(curves, i),
        })
        .collect();

    let mut zones = Vec::new();
    let mut run_start = 0;
    for i in 1..=n {
        if i == n || labels[i] != labels[run_start] {
            let end = if i == n { smps[n - 1] } else { smps[i] };
            zones.push(DominanceZone {
                start: smps[run_start],
                end,
                dominant: labels[run_start],
            });
            run_start = i;
        }
    }
    debug!(zones = zones.len(), "우위 구간 계산");
    zones
}

/// 차트 한 장에 필요한 전체 데이터.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub curves: Vec<ProfitCurve>,
    pub intersections: Vec<Intersection>,
    pub zones: Vec<DominanceZone>,
}

impl ChartData {
    pub fn build(
        outputs: &[f64],
        params: &InputParameters,
        rows: &PlantRows,
        grid: &SmpGrid,
        overrides: Option<&FormulaOverrideMap>,
    ) -> Result<Self, AnalysisError> {
        let smps = grid.points()?;
        let curves = sample_curves(outputs, params, rows, grid, overrides)?;
        let intersections = find_intersections(&curves);
        let zones = dominance_zones(&curves, &smps);
        Ok(Self {
            curves,
            intersections,
            zones,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(output: f64, slope: f64, intercept: f64, max: usize) -> ProfitCurve {
        ProfitCurve {
            output,
            points: (0..=max)
                .map(|s| CurvePoint {
                    smp: s as f64,
                    profit: slope * s as f64 + intercept,
                })
                .collect(),
        }
    }

    fn axis(max: usize) -> Vec<f64> {
        (0..=max).map(|s| s as f64).collect()
    }

    #[test]
    fn grid_includes_both_ends() {
        let pts = SmpGrid::default().points().unwrap();
        assert_eq!(pts.len(), 151);
        assert_eq!(pts[0], 0.0);
        assert_eq!(pts[150], 150.0);
        let odd = SmpGrid { max_smp: 10.0, step: 3.0 }.points().unwrap();
        assert_eq!(odd, vec![0.0, 3.0, 6.0, 9.0, 10.0]);
        let flat = SmpGrid { max_smp: 0.0, step: 1.0 }.points().unwrap();
        assert_eq!(flat, vec![0.0]);
    }

    #[test]
    fn oversized_or_invalid_grids_are_rejected() {
        for grid in [
            SmpGrid { max_smp: 150.0, step: 1e-12 },
            SmpGrid { max_smp: 150.0, step: 0.0 },
            SmpGrid { max_smp: 150.0, step: -1.0 },
            SmpGrid { max_smp: f64::INFINITY, step: 1.0 },
            SmpGrid { max_smp: 150.0, step: f64::NAN },
            SmpGrid { max_smp: -10.0, step: 1.0 },
        ] {
            assert!(
                matches!(grid.points(), Err(AnalysisError::DegenerateInput(_))),
                "{grid:?}"
            );
        }
        let largest = SmpGrid {
            max_smp: MAX_GRID_POINTS as f64,
            step: 1.0,
        };
        assert_eq!(largest.points().unwrap().len(), MAX_GRID_POINTS + 1);
    }

    #[test]
    fn chart_with_tiny_step_fails_before_sampling() {
        let grid = SmpGrid { max_smp: 150.0, step: 1e-12 };
        let result = ChartData::build(
            &[93.0],
            &InputParameters::default(),
            &PlantRows::default(),
            &grid,
            None,
        );
        assert!(matches!(result, Err(AnalysisError::DegenerateInput(_))));
    }

    #[test]
    fn empty_selection_is_one_stopped_zone() {
        let data = ChartData::build(
            &[],
            &InputParameters::default(),
            &PlantRows::default(),
            &SmpGrid::default(),
            None,
        )
        .unwrap();
        assert!(data.curves.is_empty());
        assert!(data.intersections.is_empty());
        assert_eq!(
            data.zones,
            vec![DominanceZone {
                start: 0.0,
                end: 150.0,
                dominant: Dominant::Stopped,
            }]
        );
    }

    #[test]
    fn finds_crossing_of_two_lines() {
        let a = line(93.0, 2.0, -100.0, 100);
        let b = line(80.0, 1.0, -40.0, 100);
        let hits = find_intersections(&[a, b]);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].smp - 60.0).abs() < 1e-9);
        assert!((hits[0].profit - 20.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        let a = line(93.0, 1.0, 0.0, 10);
        let b = line(80.0, 1.0, 5.0, 10);
        assert!(find_intersections(&[a, b]).is_empty());
    }

    #[test]
    fn zones_start_stopped_and_cover_range() {
        let a = line(93.0, 2.0, -100.0, 100);
        let b = line(80.0, 1.0, -40.0, 100);
        let zones = dominance_zones(&[a, b], &axis(100));
        assert_eq!(zones[0].dominant, Dominant::Stopped);
        assert_eq!(zones[0].start, 0.0);
        assert_eq!(zones[0].end, 41.0);
        assert_eq!(zones[1].dominant, Dominant::Output(80.0));
        assert_eq!(zones.last().map(|z| z.dominant), Some(Dominant::Output(93.0)));
        let total: f64 = zones.iter().map(DominanceZone::width).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn equal_profit_goes_to_first_listed_output() {
        let a = line(65.0, 1.0, 1.0, 5);
        let b = line(93.0, 1.0, 1.0, 5);
        let zones = dominance_zones(&[a, b], &axis(5));
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].dominant, Dominant::Output(65.0));
    }
}
