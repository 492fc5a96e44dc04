//! 손익분기 SMP 와 출력 간 동일이익 SMP.
//!
//! 공헌이익은 SMP 에 대해 1차식이다(전력 판매만 SMP 에 비례). 따라서 SMP=0 에서
//! 엔진을 한 번 돌려 SMP 와 무관한 항을 얻고, 전력 판매 계수로 나눠 바로 푼다.

use serde::Serialize;
use tracing::debug;

use crate::analysis::{compute, AnalysisError};
use crate::conversion::{daily_transmitted_kwh, won_to_million};
use crate::model::{InputParameters, PlantRowInput, PlantRows, MINIMUM_OUTPUT, REDUCED_OUTPUT};

/// 이 값보다 작은 계수는 0으로 본다.
const COEFFICIENT_EPS: f64 = 1e-12;

/// 임계 SMP 계산 결과.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "smp", rename_all = "camelCase")]
pub enum Threshold {
    /// 해당 SMP [원/kWh]
    At(f64),
    /// SMP 계수가 0이라 교차점이 없음
    NoCrossover,
}

impl Threshold {
    pub fn value(self) -> Option<f64> {
        match self {
            Threshold::At(v) => Some(v),
            Threshold::NoCrossover => None,
        }
    }

    fn solve(numerator: f64, coefficient: f64) -> Self {
        if coefficient.abs() < COEFFICIENT_EPS {
            return Threshold::NoCrossover;
        }
        let smp = numerator / coefficient;
        if smp.is_finite() {
            Threshold::At(smp)
        } else {
            Threshold::NoCrossover
        }
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Threshold::At(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            Threshold::NoCrossover => f.write_str("-"),
        }
    }
}

/// SMP 1원/kWh 당 하루 전력 판매 증가분 [백만원/일].
pub fn sales_power_coefficient(output: f64, row: &PlantRowInput) -> f64 {
    won_to_million(daily_transmitted_kwh(output, row.internal_consumption_rate))
}

/// SMP=0 에서의 공헌이익 (SMP 와 무관한 항의 합).
fn profit_at_zero(output: f64, params: &InputParameters, row: &PlantRowInput) -> Result<f64, AnalysisError> {
    Ok(compute(output, params, row, 0.0, None)?.contribution_profit)
}

/// 공헌이익이 0이 되는 SMP.
pub fn break_even_smp(
    output: f64,
    params: &InputParameters,
    row: &PlantRowInput,
) -> Result<Threshold, AnalysisError> {
    let base = compute(output, params, row, 0.0, None)?;
    let required_sales_power = base.cost_total - base.sales_rec;
    let threshold = Threshold::solve(required_sales_power, sales_power_coefficient(output, row));
    debug!(output, %threshold, "손익분기 SMP");
    Ok(threshold)
}

/// 두 출력의 공헌이익이 같아지는 SMP.
pub fn equal_profit_smp_between(
    params: &InputParameters,
    (output_a, row_a): (f64, &PlantRowInput),
    (output_b, row_b): (f64, &PlantRowInput),
) -> Result<Threshold, AnalysisError> {
    let fixed_a = profit_at_zero(output_a, params, row_a)?;
    let fixed_b = profit_at_zero(output_b, params, row_b)?;
    let slope_a = sales_power_coefficient(output_a, row_a);
    let slope_b = sales_power_coefficient(output_b, row_b);
    let threshold = Threshold::solve(fixed_b - fixed_a, slope_a - slope_b);
    debug!(output_a, output_b, %threshold, "동일이익 SMP");
    Ok(threshold)
}

/// 80 MW 와 65 MW 의 공헌이익이 같아지는 SMP.
pub fn equal_profit_smp(
    params: &InputParameters,
    row80: &PlantRowInput,
    row65: &PlantRowInput,
) -> Result<Threshold, AnalysisError> {
    equal_profit_smp_between(params, (REDUCED_OUTPUT, row80), (MINIMUM_OUTPUT, row65))
}

/// 화면에 게시하는 세 임계값.
///
/// `threshold_65mw` 는 이름과 달리 80↔65 MW 동일이익 SMP 이다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    #[serde(rename = "threshold80MW")]
    pub threshold_80mw: Threshold,
    #[serde(rename = "threshold65MW")]
    pub threshold_65mw: Threshold,
    pub threshold_stop: Threshold,
}

pub fn thresholds(params: &InputParameters, rows: &PlantRows) -> Result<Thresholds, AnalysisError> {
    Ok(Thresholds {
        threshold_80mw: break_even_smp(REDUCED_OUTPUT, params, &rows.mw80)?,
        threshold_65mw: equal_profit_smp(params, &rows.mw80, &rows.mw65)?,
        threshold_stop: break_even_smp(MINIMUM_OUTPUT, params, &rows.mw65)?,
    })
}
