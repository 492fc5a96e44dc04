use serde::{Deserialize, Serialize};

use crate::conversion::{fraction_to_percent, percent_to_fraction};

/// 0~1 범위로 표현한 비율.
///
/// 엔진 내부 계산은 항상 소수를 쓰고, 표시/저장/수식 컨텍스트에서는
/// [`Percentage`] 로 바꿔서 내보낸다.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fraction(f64);

/// 0~100 범위로 표현한 비율.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Fraction {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// 1 - x
    pub fn complement(self) -> Self {
        Self(1.0 - self.0)
    }

    pub fn to_percentage(self) -> Percentage {
        Percentage(fraction_to_percent(self.0))
    }
}

impl Percentage {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_fraction(self) -> Fraction {
        Fraction(percent_to_fraction(self.0))
    }
}

impl From<Percentage> for Fraction {
    fn from(value: Percentage) -> Self {
        value.to_fraction()
    }
}

impl From<Fraction> for Percentage {
    fn from(value: Fraction) -> Self {
        value.to_percentage()
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*}%", p, self.0),
            None => write!(f, "{}%", self.0),
        }
    }
}
