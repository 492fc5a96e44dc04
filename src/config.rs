use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::FormulaOverrideMap;
use crate::chart::SmpGrid;
use crate::curtailment::MIN_CURTAILMENT_HOURS;
use crate::model::{InputParameters, PlantRows, CALIBRATED_OUTPUTS};

/// 기본 시나리오 파일 이름.
pub const DEFAULT_SCENARIO_PATH: &str = "dispatch.toml";

/// 차트 축과 곡선을 그릴 출력 목록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub max_smp: f64,
    pub step: f64,
    pub outputs: Vec<f64>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        let grid = SmpGrid::default();
        Self {
            max_smp: grid.max_smp,
            step: grid.step,
            outputs: CALIBRATED_OUTPUTS.to_vec(),
        }
    }
}

impl ChartSettings {
    pub fn grid(&self) -> SmpGrid {
        SmpGrid {
            max_smp: self.max_smp,
            step: self.step,
        }
    }
}

/// 감발 구간 탐색 설정. 임계값이 없으면 80MW 감발 기준 SMP 를 쓴다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurtailmentSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub min_hours: usize,
}

impl Default for CurtailmentSettings {
    fn default() -> Self {
        Self {
            threshold: None,
            min_hours: MIN_CURTAILMENT_HOURS,
        }
    }
}

/// 분석 시나리오 설정.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// ko / en / auto
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub params: InputParameters,
    pub rows: PlantRows,
    #[serde(skip_serializing_if = "FormulaOverrideMap::is_empty")]
    pub overrides: FormulaOverrideMap,
    pub chart: ChartSettings,
    pub curtailment: CurtailmentSettings,
}

/// 설정 로드/저장 시 발생 가능한 오류를 표현한다.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 파일 입출력 오류
    #[error("파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    /// TOML 역직렬화 오류
    #[error("설정 파싱 오류: {0}")]
    Serde(#[from] toml::de::Error),
    /// TOML 직렬화 오류
    #[error("설정 직렬화 오류: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Scenario {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    /// 시나리오를 파일에 저장한다.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 재정의가 있을 때만 넘긴다.
    pub fn overrides(&self) -> Option<&FormulaOverrideMap> {
        (!self.overrides.is_empty()).then_some(&self.overrides)
    }
}

/// 시나리오 파일을 로드하거나 없으면 기본 시나리오를 생성한다.
pub fn load_or_default(path: &Path) -> Result<Scenario, ConfigError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        let scenario = Scenario::from_toml_str(&content)?;
        debug!(path = %path.display(), overrides = scenario.overrides.len(), "시나리오 로드");
        Ok(scenario)
    } else {
        let scenario = Scenario::default();
        scenario.save(path)?;
        info!(path = %path.display(), "기본 시나리오 생성");
        Ok(scenario)
    }
}
