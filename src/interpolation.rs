//! 세 보정점(93/80/65 MW) 사이의 선형 보간.

use crate::model::{PlantRowInput, PlantRows, MINIMUM_OUTPUT, NOMINAL_OUTPUT, REDUCED_OUTPUT};

fn blend(upper: &PlantRowInput, lower: &PlantRowInput, ratio: f64) -> PlantRowInput {
    PlantRowInput {
        transmission_efficiency: upper.transmission_efficiency * (1.0 - ratio)
            + lower.transmission_efficiency * ratio,
        internal_consumption_rate: upper.internal_consumption_rate * (1.0 - ratio)
            + lower.internal_consumption_rate * ratio,
    }
}

/// 임의 출력에 대한 송전효율/소내소비율을 구한다.
///
/// 보정점에서는 입력 행을 그대로 돌려주고, 93 MW 초과는 93 MW 행, 65 MW 미만은
/// 65 MW 행으로 고정한다.
pub fn interpolate(output: f64, rows: &PlantRows) -> PlantRowInput {
    if output >= NOMINAL_OUTPUT {
        rows.mw93
    } else if output == REDUCED_OUTPUT {
        rows.mw80
    } else if output > REDUCED_OUTPUT {
        let ratio = (NOMINAL_OUTPUT - output) / (NOMINAL_OUTPUT - REDUCED_OUTPUT);
        blend(&rows.mw93, &rows.mw80, ratio)
    } else if output > MINIMUM_OUTPUT {
        let ratio = (REDUCED_OUTPUT - output) / (REDUCED_OUTPUT - MINIMUM_OUTPUT);
        blend(&rows.mw80, &rows.mw65, ratio)
    } else {
        rows.mw65
    }
}
