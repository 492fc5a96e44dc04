//! 출력/SMP 한 쌍에 대한 공헌이익 계산 엔진.

mod engine;
mod field;
mod overrides;

use thiserror::Error;

pub use engine::{compute, preview, AnalysisResult};
pub use field::{input, Field};
pub use overrides::{FormulaOverride, FormulaOverrideMap};

/// 계산 엔진 오류.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// NaN/무한대 입력
    #[error("입력값 {name} 이(가) 유한한 숫자가 아님: {value}")]
    InvalidInput { name: &'static str, value: f64 },
    /// 0 나누기 등으로 계산이 성립하지 않는 입력
    #[error("계산 불가능한 입력: {0}")]
    DegenerateInput(String),
    /// 잘못된 재정의 값
    #[error("{field} 재정의 오류: {reason}")]
    InvalidOverride { field: Field, reason: String },
    /// 재정의 수식 간 순환 참조
    #[error("재정의 수식 순환 참조: {}", .0.join(" -> "))]
    OverrideCycle(Vec<String>),
}
