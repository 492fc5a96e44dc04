//! 발전 손익 계산에 공통으로 쓰는 상수와 단위 환산.

/// 1 kWh = 860 kcal
pub const KCAL_PER_KWH: f64 = 860.0;
/// WC 고정 투입량 [t/일]
pub const WC_DAILY_TONNAGE: f64 = 700.0;
/// REC 단가 [원/kWh]
pub const REC_PRICE: f64 = 63.0;
/// 용수요금 배분 기준 연간 가동일수
pub const OPERATING_DAYS: f64 = 316.0;
/// 용수요금 기본액 [원]
pub const WATER_FEE_BASE: f64 = 1_158_000.0;
/// 약품비 기준 출력 [MW]
pub const CHEMICAL_REFERENCE_OUTPUT: f64 = 93.0;
/// 기준 출력의 약품비 단가 [원/kWh]
pub const CHEMICAL_REFERENCE_COST: f64 = 7.6;
/// 감발 시 약품비 보정 계수
pub const CHEMICAL_REDUCTION_FACTOR: f64 = 0.95;
/// 시간당 예상이익 환산 시 곱하는 가동시간
pub const HOURLY_PROFIT_HOURS: f64 = 10.0;

pub const HOURS_PER_DAY: f64 = 24.0;
pub const KW_PER_MW: f64 = 1000.0;
pub const WON_PER_MILLION: f64 = 1_000_000.0;

/// 백분율을 소수로 바꾼다 (8.4 -> 0.084).
pub fn percent_to_fraction(percent: f64) -> f64 {
    percent / 100.0
}

/// 소수를 백분율로 바꾼다 (0.084 -> 8.4).
pub fn fraction_to_percent(fraction: f64) -> f64 {
    fraction * 100.0
}

/// 소내소비를 제외한 송전 비율 (1 - 소내소비율).
pub fn net_ratio(internal_consumption_rate_percent: f64) -> f64 {
    1.0 - percent_to_fraction(internal_consumption_rate_percent)
}

/// 출력 [MW]을 하루 송전량 [kWh/일]으로 환산한다.
pub fn daily_transmitted_kwh(output_mw: f64, internal_consumption_rate_percent: f64) -> f64 {
    output_mw * KW_PER_MW * net_ratio(internal_consumption_rate_percent) * HOURS_PER_DAY
}

/// 원 단위를 백만원 단위로 바꾼다.
pub fn won_to_million(won: f64) -> f64 {
    won / WON_PER_MILLION
}

/// 연료 발열량 [kcal/kg] 과 단가 [원/t] 로 송전단 발전단가 [원/kWh] 를 구한다.
pub fn fuel_generation_cost(unit_price: f64, calorific_value: f64, transmission_efficiency: f64) -> f64 {
    (unit_price / calorific_value) * KCAL_PER_KWH * (100.0 / transmission_efficiency) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_kwh_of_nominal_output() {
        // 93 MW, 소내소비 8.4% -> 85.188 MW 송전
        let kwh = daily_transmitted_kwh(93.0, 8.4);
        assert!((kwh - 85.188 * 1000.0 * 24.0).abs() < 1e-6);
    }

    #[test]
    fn percent_fraction_inverse() {
        assert!((fraction_to_percent(percent_to_fraction(45.3)) - 45.3).abs() < 1e-12);
    }
}
