use serde::Serialize;
use tracing::{debug, warn};

use super::field::{input, Field};
use super::overrides::{FormulaOverride, FormulaOverrideMap};
use super::AnalysisError;
use crate::conversion::{
    daily_transmitted_kwh, fuel_generation_cost, net_ratio, percent_to_fraction, won_to_million,
    CHEMICAL_REDUCTION_FACTOR, CHEMICAL_REFERENCE_COST, CHEMICAL_REFERENCE_OUTPUT,
    HOURLY_PROFIT_HOURS, HOURS_PER_DAY, KCAL_PER_KWH, OPERATING_DAYS, REC_PRICE,
    WATER_FEE_BASE, WC_DAILY_TONNAGE,
};
use crate::formula::{self, Context, FormulaEvaluationError};
use crate::model::{InputParameters, PlantRowInput};
use crate::quantity::{Fraction, Percentage};

/// 출력/SMP 한 쌍의 계산 결과. 모든 값은 유한하다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub output: f64,
    pub smp: f64,
    pub params: InputParameters,
    pub row: PlantRowInput,
    /// 송전량 [MW]
    pub transmission_amount: f64,
    /// 발전효율 [%]
    pub generation_efficiency: f64,
    /// WC 사용량 [t/일]
    pub wc_fuel_consumption: f64,
    /// PKS 사용량 [t/일]
    pub pks_fuel_consumption: f64,
    /// WC 혼소율
    pub wc_co_firing_rate: Percentage,
    /// PKS 발전단가 [원/kWh]
    pub pks_generation_cost: f64,
    /// WC 발전단가 [원/kWh]
    pub wc_generation_cost: f64,
    /// 혼소 가중 발전단가 [원/kWh]
    pub total_generation_cost: f64,
    /// 약품비 단가 [원/kWh]
    pub chemical_cost: f64,
    /// 용수요금 단가 [원/kWh]
    pub water_fee: f64,
    /// 전력 판매 [백만원/일]
    pub sales_power: f64,
    /// REC 판매 [백만원/일]
    #[serde(rename = "salesREC")]
    pub sales_rec: f64,
    pub sales_total: f64,
    /// 연료비 [백만원/일]
    pub cost_fuel: f64,
    pub cost_chemical: f64,
    pub cost_water: f64,
    pub cost_total: f64,
    /// 공헌이익 [백만원/일]
    pub contribution_profit: f64,
    /// 시간당 예상이익 (공헌이익/24 × 10)
    pub hourly_expected_profit: f64,
    /// 재정의 수식 평가에 실패해 기본값으로 계산된 항목
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<Field>,
}

impl AnalysisResult {
    /// 항목 값을 외부 표현(혼소율은 백분율)으로 돌려준다.
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::TransmissionAmount => self.transmission_amount,
            Field::GenerationEfficiency => self.generation_efficiency,
            Field::WcFuelConsumption => self.wc_fuel_consumption,
            Field::PksFuelConsumption => self.pks_fuel_consumption,
            Field::WcCoFiringRate => self.wc_co_firing_rate.value(),
            Field::PksGenerationCost => self.pks_generation_cost,
            Field::WcGenerationCost => self.wc_generation_cost,
            Field::TotalGenerationCost => self.total_generation_cost,
            Field::ChemicalCost => self.chemical_cost,
            Field::WaterFee => self.water_fee,
            Field::SalesPower => self.sales_power,
            Field::SalesRec => self.sales_rec,
            Field::SalesTotal => self.sales_total,
            Field::CostFuel => self.cost_fuel,
            Field::CostChemical => self.cost_chemical,
            Field::CostWater => self.cost_water,
            Field::CostTotal => self.cost_total,
            Field::ContributionProfit => self.contribution_profit,
            Field::HourlyExpectedProfit => self.hourly_expected_profit,
        }
    }

    pub fn wc_co_firing_fraction(&self) -> Fraction {
        self.wc_co_firing_rate.to_fraction()
    }

    /// 입력값과 19개 항목 전체를 담은 수식 컨텍스트.
    pub fn to_context(&self) -> Context {
        let mut ctx = input_context(self.output, &self.params, &self.row, self.smp);
        for field in Field::ALL {
            ctx.set(field.code(), self.get(field));
        }
        ctx
    }

    fn from_values(
        output: f64,
        smp: f64,
        params: &InputParameters,
        row: &PlantRowInput,
        v: &[f64; 19],
        fallbacks: Vec<Field>,
    ) -> Self {
        let at = |f: Field| v[f.index()];
        Self {
            output,
            smp,
            params: *params,
            row: *row,
            transmission_amount: at(Field::TransmissionAmount),
            generation_efficiency: at(Field::GenerationEfficiency),
            wc_fuel_consumption: at(Field::WcFuelConsumption),
            pks_fuel_consumption: at(Field::PksFuelConsumption),
            wc_co_firing_rate: Percentage::new(at(Field::WcCoFiringRate)),
            pks_generation_cost: at(Field::PksGenerationCost),
            wc_generation_cost: at(Field::WcGenerationCost),
            total_generation_cost: at(Field::TotalGenerationCost),
            chemical_cost: at(Field::ChemicalCost),
            water_fee: at(Field::WaterFee),
            sales_power: at(Field::SalesPower),
            sales_rec: at(Field::SalesRec),
            sales_total: at(Field::SalesTotal),
            cost_fuel: at(Field::CostFuel),
            cost_chemical: at(Field::CostChemical),
            cost_water: at(Field::CostWater),
            cost_total: at(Field::CostTotal),
            contribution_profit: at(Field::ContributionProfit),
            hourly_expected_profit: at(Field::HourlyExpectedProfit),
            fallbacks,
        }
    }
}

fn input_context(output: f64, params: &InputParameters, row: &PlantRowInput, smp: f64) -> Context {
    let mut ctx = Context::new();
    ctx.set(input::OUTPUT, output);
    ctx.set(input::SMP, smp);
    ctx.set(input::BASE_SMP, params.base_smp);
    ctx.set(input::TRANSMISSION_EFFICIENCY, row.transmission_efficiency);
    ctx.set(input::INTERNAL_CONSUMPTION_RATE, row.internal_consumption_rate);
    ctx.set(input::PKS_CALORIFIC_VALUE, params.pks_calorific_value);
    ctx.set(input::WC_CALORIFIC_VALUE, params.wc_calorific_value);
    ctx.set(input::PKS_UNIT_PRICE, params.pks_unit_price);
    ctx.set(input::WC_UNIT_PRICE, params.wc_unit_price);
    ctx
}

fn check_inputs(
    output: f64,
    params: &InputParameters,
    row: &PlantRowInput,
    smp: f64,
) -> Result<(), AnalysisError> {
    let named = [
        (input::OUTPUT, output),
        (input::SMP, smp),
        (input::BASE_SMP, params.base_smp),
        (input::TRANSMISSION_EFFICIENCY, row.transmission_efficiency),
        (input::INTERNAL_CONSUMPTION_RATE, row.internal_consumption_rate),
        (input::PKS_CALORIFIC_VALUE, params.pks_calorific_value),
        (input::WC_CALORIFIC_VALUE, params.wc_calorific_value),
        (input::PKS_UNIT_PRICE, params.pks_unit_price),
        (input::WC_UNIT_PRICE, params.wc_unit_price),
    ];
    for (name, value) in named {
        if !value.is_finite() {
            return Err(AnalysisError::InvalidInput { name, value });
        }
    }

    let degenerate = |msg: String| Err(AnalysisError::DegenerateInput(msg));
    if output <= 0.0 {
        return degenerate(format!("출력은 0보다 커야 함 (output={output})"));
    }
    if row.internal_consumption_rate >= 100.0 {
        return degenerate(format!(
            "소내소비율은 100% 미만이어야 함 (internalConsumptionRate={})",
            row.internal_consumption_rate
        ));
    }
    if row.transmission_efficiency <= 0.0 || row.transmission_efficiency >= 100.0 {
        return degenerate(format!(
            "송전효율은 0%와 100% 사이여야 함 (transmissionEfficiency={})",
            row.transmission_efficiency
        ));
    }
    if params.pks_calorific_value <= 0.0 || params.wc_calorific_value <= 0.0 {
        return degenerate(format!(
            "발열량은 0보다 커야 함 (PKS={}, WC={})",
            params.pks_calorific_value, params.wc_calorific_value
        ));
    }
    Ok(())
}

struct DefaultInputs<'a> {
    output: f64,
    smp: f64,
    params: &'a InputParameters,
    row: &'a PlantRowInput,
}

/// 재정의가 없을 때의 기본 계산식. `v` 에는 앞선 항목이 이미 채워져 있다.
fn default_value(field: Field, inp: &DefaultInputs<'_>, v: &[f64; 19]) -> Result<f64, AnalysisError> {
    let at = |f: Field| v[f.index()];
    let p = inp.params;
    let ratio = net_ratio(inp.row.internal_consumption_rate);
    let daily_kwh = daily_transmitted_kwh(inp.output, inp.row.internal_consumption_rate);

    let value = match field {
        Field::TransmissionAmount => inp.output * ratio,
        Field::GenerationEfficiency => inp.row.transmission_efficiency / ratio,
        Field::WcFuelConsumption => WC_DAILY_TONNAGE,
        Field::PksFuelConsumption => {
            let heat_kcal = (inp.output / percent_to_fraction(at(Field::GenerationEfficiency)))
                * KCAL_PER_KWH
                * HOURS_PER_DAY;
            (heat_kcal - at(Field::WcFuelConsumption) * p.wc_calorific_value) / p.pks_calorific_value
        }
        Field::WcCoFiringRate => {
            let wc_heat = at(Field::WcFuelConsumption) * p.wc_calorific_value;
            let pks_heat = at(Field::PksFuelConsumption) * p.pks_calorific_value;
            Fraction::new(wc_heat / (pks_heat + wc_heat)).to_percentage().value()
        }
        Field::PksGenerationCost => {
            fuel_generation_cost(p.pks_unit_price, p.pks_calorific_value, inp.row.transmission_efficiency)
        }
        Field::WcGenerationCost => {
            fuel_generation_cost(p.wc_unit_price, p.wc_calorific_value, inp.row.transmission_efficiency)
        }
        Field::TotalGenerationCost => {
            let wc = Percentage::new(at(Field::WcCoFiringRate)).to_fraction();
            at(Field::PksGenerationCost) * wc.complement().value()
                + at(Field::WcGenerationCost) * wc.value()
        }
        Field::ChemicalCost => {
            if inp.output == CHEMICAL_REFERENCE_OUTPUT {
                CHEMICAL_REFERENCE_COST
            } else {
                (CHEMICAL_REFERENCE_OUTPUT / inp.output) * CHEMICAL_REFERENCE_COST * CHEMICAL_REDUCTION_FACTOR
            }
        }
        Field::WaterFee => WATER_FEE_BASE / (at(Field::TransmissionAmount) * HOURS_PER_DAY * OPERATING_DAYS),
        Field::SalesPower => won_to_million(inp.smp * daily_kwh),
        Field::SalesRec => won_to_million(REC_PRICE * daily_kwh),
        Field::SalesTotal => at(Field::SalesPower) + at(Field::SalesRec),
        Field::CostFuel => won_to_million(
            at(Field::PksFuelConsumption) * p.pks_unit_price
                + at(Field::WcFuelConsumption) * p.wc_unit_price,
        ),
        Field::CostChemical => won_to_million(daily_kwh * at(Field::ChemicalCost)),
        Field::CostWater => won_to_million(daily_kwh * at(Field::WaterFee)),
        Field::CostTotal => at(Field::CostFuel) + at(Field::CostChemical) + at(Field::CostWater),
        Field::ContributionProfit => at(Field::SalesTotal) - at(Field::CostTotal),
        Field::HourlyExpectedProfit => (at(Field::ContributionProfit) / HOURS_PER_DAY) * HOURLY_PROFIT_HOURS,
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::DegenerateInput(format!(
            "{field} 계산 결과가 유한하지 않음: {value}"
        )))
    }
}

/// 출력 `output`, SMP `smp` 에서 19개 항목을 고정 순서로 계산한다.
///
/// 재정의 수식은 원시 입력과 자신보다 앞서 계산된 항목만 볼 수 있다. 수식 평가가
/// 실패하면 경고를 남기고 해당 항목의 기본값을 쓴다. 재정의 맵 자체가 잘못된
/// 경우(순환 참조, 유한하지 않은 고정값)와 계산이 성립하지 않는 입력은 오류로
/// 돌려준다.
pub fn compute(
    output: f64,
    params: &InputParameters,
    row: &PlantRowInput,
    smp: f64,
    overrides: Option<&FormulaOverrideMap>,
) -> Result<AnalysisResult, AnalysisError> {
    check_inputs(output, params, row, smp)?;
    let overrides = overrides.filter(|m| !m.is_empty());
    if let Some(map) = overrides {
        map.validate()?;
    }

    let inputs = DefaultInputs {
        output,
        smp,
        params,
        row,
    };
    let mut ctx = input_context(output, params, row, smp);
    let mut values = [0.0; 19];
    let mut fallbacks = Vec::new();

    for field in Field::ALL {
        let value = match overrides.and_then(|m| m.get(field)) {
            Some(FormulaOverride::Fixed { fixed_value }) => *fixed_value,
            Some(FormulaOverride::Formula { formula: src }) => match formula::evaluate(src, &ctx) {
                Ok(v) => v,
                Err(err) => {
                    warn!(field = field.code(), formula = %src, error = %err, "수식 재정의 평가 실패, 기본값 사용");
                    fallbacks.push(field);
                    default_value(field, &inputs, &values)?
                }
            },
            None => default_value(field, &inputs, &values)?,
        };
        values[field.index()] = value;
        ctx.set(field.code(), value);
    }

    let result = AnalysisResult::from_values(output, smp, params, row, &values, fallbacks);
    debug!(
        output,
        smp,
        contribution_profit = result.contribution_profit,
        "공헌이익 계산"
    );
    Ok(result)
}

/// 계산된 결과 위에서 임의의 수식을 미리 평가한다.
pub fn preview(expression: &str, result: &AnalysisResult) -> Result<f64, FormulaEvaluationError> {
    formula::evaluate(expression, &result.to_context())
}
