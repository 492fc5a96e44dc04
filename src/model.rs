use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 정격 출력 [MW]
pub const NOMINAL_OUTPUT: f64 = 93.0;
/// 1단 감발 출력 [MW]
pub const REDUCED_OUTPUT: f64 = 80.0;
/// 최저 감발 출력 [MW]
pub const MINIMUM_OUTPUT: f64 = 65.0;
/// 보정값이 존재하는 출력 수준. 나머지 출력은 보간으로만 얻는다.
pub const CALIBRATED_OUTPUTS: [f64; 3] = [NOMINAL_OUTPUT, REDUCED_OUTPUT, MINIMUM_OUTPUT];

/// 발전소 공통 입력값 (운전원이 설정).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputParameters {
    /// 기준 SMP [원/kWh]
    #[serde(rename = "baseSMP")]
    pub base_smp: f64,
    /// PKS 발열량 [kcal/kg]
    pub pks_calorific_value: f64,
    /// WC 발열량 [kcal/kg]
    pub wc_calorific_value: f64,
    /// PKS 단가 [원/t]
    pub pks_unit_price: f64,
    /// WC 단가 [원/t]
    pub wc_unit_price: f64,
}

impl Default for InputParameters {
    fn default() -> Self {
        Self {
            base_smp: 150.0,
            pks_calorific_value: 4000.0,
            wc_calorific_value: 3750.0,
            pks_unit_price: 223_000.0,
            wc_unit_price: 49_000.0,
        }
    }
}

/// 출력 수준별 보정 입력값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantRowInput {
    /// 송전효율 [%]
    pub transmission_efficiency: f64,
    /// 소내소비율 [%]
    pub internal_consumption_rate: f64,
}

impl PlantRowInput {
    pub const fn new(transmission_efficiency: f64, internal_consumption_rate: f64) -> Self {
        Self {
            transmission_efficiency,
            internal_consumption_rate,
        }
    }
}

/// 93/80/65 MW 세 보정점.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantRows {
    pub mw93: PlantRowInput,
    pub mw80: PlantRowInput,
    pub mw65: PlantRowInput,
}

impl Default for PlantRows {
    fn default() -> Self {
        Self {
            mw93: PlantRowInput::new(30.4, 8.4),
            mw80: PlantRowInput::new(29.8, 9.2),
            mw65: PlantRowInput::new(28.5, 10.5),
        }
    }
}

/// 하루치 시간별 SMP. `hourly_prices[i]` 는 i+1시의 가격이며 0 이하는 결측이다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySmpData {
    pub date: NaiveDate,
    pub hourly_prices: [f64; 24],
}

impl DailySmpData {
    /// 24시 가격. 다음 날 감발 구간의 연속성 판단에 쓴다.
    pub fn last_hour_price(&self) -> f64 {
        self.hourly_prices[23]
    }

    /// 결측을 제외한 평균 가격.
    pub fn average_price(&self) -> Option<f64> {
        let valid: Vec<f64> = self.hourly_prices.iter().copied().filter(|p| *p > 0.0).collect();
        if valid.is_empty() {
            None
        } else {
            Some(valid.iter().sum::<f64>() / valid.len() as f64)
        }
    }
}

/// 날짜순으로 정렬된 시간별 SMP 이력.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HourlySmpData {
    pub days: Vec<DailySmpData>,
}

/// 가격 이력 파일을 읽을 때 발생 가능한 오류.
#[derive(Debug, Error)]
pub enum PriceDataError {
    #[error("가격 파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    #[error("가격 파일 파싱 오류: {0}")]
    Json(#[from] serde_json::Error),
}

impl HourlySmpData {
    pub fn new(mut days: Vec<DailySmpData>) -> Self {
        days.sort_by_key(|d| d.date);
        Self { days }
    }

    /// `[{"date": "2024-05-01", "hourlyPrices": [..24]}, ...]` 형식의 JSON 을 읽는다.
    pub fn from_json_str(src: &str) -> Result<Self, PriceDataError> {
        let days: Vec<DailySmpData> = serde_json::from_str(src)?;
        Ok(Self::new(days))
    }

    pub fn load(path: &Path) -> Result<Self, PriceDataError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
