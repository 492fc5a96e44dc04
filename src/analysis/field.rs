use serde::{Deserialize, Serialize};

/// 수식 컨텍스트에 항상 들어가는 원시 입력 변수.
pub mod input {
    pub const OUTPUT: &str = "output";
    pub const SMP: &str = "smp";
    pub const BASE_SMP: &str = "baseSMP";
    pub const TRANSMISSION_EFFICIENCY: &str = "transmissionEfficiency";
    pub const INTERNAL_CONSUMPTION_RATE: &str = "internalConsumptionRate";
    pub const PKS_CALORIFIC_VALUE: &str = "pksCalorificValue";
    pub const WC_CALORIFIC_VALUE: &str = "wcCalorificValue";
    pub const PKS_UNIT_PRICE: &str = "pksUnitPrice";
    pub const WC_UNIT_PRICE: &str = "wcUnitPrice";

    pub const ALL: [&str; 9] = [
        OUTPUT,
        SMP,
        BASE_SMP,
        TRANSMISSION_EFFICIENCY,
        INTERNAL_CONSUMPTION_RATE,
        PKS_CALORIFIC_VALUE,
        WC_CALORIFIC_VALUE,
        PKS_UNIT_PRICE,
        WC_UNIT_PRICE,
    ];
}

/// 파생 계산 항목.
///
/// 선언 순서가 곧 평가 순서(위상 정렬)다. 각 항목은 자신보다 앞선 항목과 원시
/// 입력만 참조할 수 있다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    TransmissionAmount,
    GenerationEfficiency,
    WcFuelConsumption,
    PksFuelConsumption,
    /// 외부 표현은 백분율
    WcCoFiringRate,
    PksGenerationCost,
    WcGenerationCost,
    TotalGenerationCost,
    ChemicalCost,
    WaterFee,
    SalesPower,
    #[serde(rename = "salesREC")]
    SalesRec,
    SalesTotal,
    CostFuel,
    CostChemical,
    CostWater,
    CostTotal,
    ContributionProfit,
    HourlyExpectedProfit,
}

impl Field {
    pub const ALL: [Field; 19] = [
        Field::TransmissionAmount,
        Field::GenerationEfficiency,
        Field::WcFuelConsumption,
        Field::PksFuelConsumption,
        Field::WcCoFiringRate,
        Field::PksGenerationCost,
        Field::WcGenerationCost,
        Field::TotalGenerationCost,
        Field::ChemicalCost,
        Field::WaterFee,
        Field::SalesPower,
        Field::SalesRec,
        Field::SalesTotal,
        Field::CostFuel,
        Field::CostChemical,
        Field::CostWater,
        Field::CostTotal,
        Field::ContributionProfit,
        Field::HourlyExpectedProfit,
    ];

    /// 수식에서 쓰는 변수 코드.
    pub fn code(self) -> &'static str {
        match self {
            Field::TransmissionAmount => "transmissionAmount",
            Field::GenerationEfficiency => "generationEfficiency",
            Field::WcFuelConsumption => "wcFuelConsumption",
            Field::PksFuelConsumption => "pksFuelConsumption",
            Field::WcCoFiringRate => "wcCoFiringRate",
            Field::PksGenerationCost => "pksGenerationCost",
            Field::WcGenerationCost => "wcGenerationCost",
            Field::TotalGenerationCost => "totalGenerationCost",
            Field::ChemicalCost => "chemicalCost",
            Field::WaterFee => "waterFee",
            Field::SalesPower => "salesPower",
            Field::SalesRec => "salesREC",
            Field::SalesTotal => "salesTotal",
            Field::CostFuel => "costFuel",
            Field::CostChemical => "costChemical",
            Field::CostWater => "costWater",
            Field::CostTotal => "costTotal",
            Field::ContributionProfit => "contributionProfit",
            Field::HourlyExpectedProfit => "hourlyExpectedProfit",
        }
    }

    pub fn from_code(code: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.code() == code)
    }

    /// 평가 순서상 위치 (0부터).
    pub fn index(self) -> usize {
        self as usize
    }

    /// 표시 단위.
    pub fn unit(self) -> &'static str {
        match self {
            Field::TransmissionAmount => "MW",
            Field::GenerationEfficiency | Field::WcCoFiringRate => "%",
            Field::WcFuelConsumption | Field::PksFuelConsumption => "t/일",
            Field::PksGenerationCost
            | Field::WcGenerationCost
            | Field::TotalGenerationCost
            | Field::ChemicalCost
            | Field::WaterFee => "원/kWh",
            Field::HourlyExpectedProfit => "백만원",
            _ => "백만원/일",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
