use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::{compute, preview, AnalysisError};
use crate::chart::ChartData;
use crate::config::{self, ConfigError, Scenario, DEFAULT_SCENARIO_PATH};
use crate::curtailment::summarize_with;
use crate::formula::FormulaEvaluationError;
use crate::i18n::{resolve_language, Translator};
use crate::interpolation::interpolate;
use crate::model::{HourlySmpData, PriceDataError, NOMINAL_OUTPUT};
use crate::threshold::thresholds;
use crate::ui_cli::{self, Report};

/// 애플리케이션 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 설정 저장/로드 오류
    #[error("설정 오류: {0}")]
    Config(#[from] ConfigError),
    /// 계산 엔진 오류
    #[error("계산 오류: {0}")]
    Analysis(#[from] AnalysisError),
    /// 수식 평가 오류
    #[error("수식 오류: {0}")]
    Formula(#[from] FormulaEvaluationError),
    /// SMP 이력 파일 오류
    #[error("SMP 자료 오류: {0}")]
    PriceData(#[from] PriceDataError),
    /// JSON 출력 오류
    #[error("JSON 출력 오류: {0}")]
    Json(#[from] serde_json::Error),
    /// 감발 임계값을 정할 수 없음
    #[error("감발 기준 SMP 를 구할 수 없음 (--threshold 로 지정)")]
    NoThreshold,
}

/// 바이오매스 혼소 발전소 감발/정지 판단 도구.
#[derive(Debug, Parser)]
#[command(name = "biomass_dispatch", version)]
pub struct Cli {
    /// 시나리오 파일 (없으면 기본값으로 생성)
    #[arg(short, long, global = true, default_value = DEFAULT_SCENARIO_PATH)]
    pub config: PathBuf,

    /// 표시 언어 (auto/ko/en)
    #[arg(short = 'L', long, global = true, default_value = "auto")]
    pub lang: String,

    /// 결과를 JSON 으로 출력
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 출력별 공헌이익 분석표
    Analyze {
        /// SMP [원/kWh] (기본: 기준 SMP)
        #[arg(short, long)]
        smp: Option<f64>,
        /// 분석할 출력 [MW] (기본: 93,80,65)
        #[arg(short, long, value_delimiter = ',')]
        outputs: Vec<f64>,
    },
    /// 감발/정지 기준 SMP
    Thresholds,
    /// SMP별 공헌이익 곡선, 교차점, 우위 구간
    Chart {
        #[arg(long)]
        max_smp: Option<f64>,
        #[arg(long)]
        step: Option<f64>,
        #[arg(short, long, value_delimiter = ',')]
        outputs: Vec<f64>,
    },
    /// 시간별 SMP 이력(JSON)에서 감발 구간 찾기
    Curtailment {
        /// `[{"date": "2024-01-01", "hourlyPrices": [...24개]}]` 형식의 파일
        prices: PathBuf,
        /// 감발 기준 SMP (기본: 시나리오 값, 없으면 80MW 감발 기준)
        #[arg(short, long)]
        threshold: Option<f64>,
        #[arg(long)]
        min_hours: Option<usize>,
    },
    /// 계산 결과를 변수로 하는 임의 수식 계산
    Eval {
        formula: String,
        #[arg(short, long, default_value_t = NOMINAL_OUTPUT)]
        output: f64,
        #[arg(short, long)]
        smp: Option<f64>,
        /// 수식이 표시 라벨로 쓰였음
        #[arg(long)]
        natural: bool,
    },
    /// 변수 코드 수식 ↔ 표시 라벨 수식 변환
    Translate {
        formula: String,
        /// 라벨 수식을 코드 수식으로 변환
        #[arg(long)]
        to_code: bool,
    },
}

/// 명령 하나를 실행해 출력한다.
pub fn run(cli: Cli) -> Result<(), AppError> {
    let scenario = config::load_or_default(&cli.config)?;
    let lang = resolve_language(&cli.lang, scenario.language.as_deref());
    let tr = Translator::new_with_pack(&lang, None);
    debug!(lang = %lang, command = ?cli.command, "명령 실행");

    let report = execute(&cli.command, &scenario, &tr)?;
    if cli.json {
        println!("{}", ui_cli::render_json(&report)?);
    } else {
        print!("{}", ui_cli::render(&report, &tr));
    }
    Ok(())
}

/// 명령을 계산 결과로 바꾼다. 출력은 하지 않는다.
pub fn execute(command: &Command, scenario: &Scenario, tr: &Translator) -> Result<Report, AppError> {
    let params = &scenario.params;
    let rows = &scenario.rows;
    let overrides = scenario.overrides();
    if let Some(map) = overrides {
        map.validate()?;
    }

    let report = match command {
        Command::Analyze { smp, outputs } => {
            let smp = smp.unwrap_or(params.base_smp);
            let outputs = if outputs.is_empty() {
                scenario.chart.outputs.clone()
            } else {
                outputs.clone()
            };
            let results = outputs
                .iter()
                .map(|&output| compute(output, params, &interpolate(output, rows), smp, overrides))
                .collect::<Result<Vec<_>, _>>()?;
            Report::Analysis { smp, results }
        }
        Command::Thresholds => Report::Thresholds(thresholds(params, rows)?),
        Command::Chart {
            max_smp,
            step,
            outputs,
        } => {
            let mut settings = scenario.chart.clone();
            if let Some(v) = max_smp {
                settings.max_smp = *v;
            }
            if let Some(v) = step {
                settings.step = *v;
            }
            if !outputs.is_empty() {
                settings.outputs = outputs.clone();
            }
            let data = ChartData::build(&settings.outputs, params, rows, &settings.grid(), overrides)?;
            Report::Chart(data)
        }
        Command::Curtailment {
            prices,
            threshold,
            min_hours,
        } => {
            let data = HourlySmpData::load(prices)?;
            let threshold = match threshold.or(scenario.curtailment.threshold) {
                Some(t) => t,
                None => thresholds(params, rows)?
                    .threshold_80mw
                    .value()
                    .ok_or(AppError::NoThreshold)?,
            };
            let min_hours = min_hours.unwrap_or(scenario.curtailment.min_hours);
            info!(days = data.days.len(), threshold, min_hours, "감발 구간 분석");
            let summary = summarize_with(&data, threshold, min_hours, params, rows, overrides)?;
            Report::Curtailment(summary)
        }
        Command::Eval {
            formula,
            output,
            smp,
            natural,
        } => {
            let expression = if *natural {
                tr.formula_translator().to_code(formula)
            } else {
                formula.clone()
            };
            let smp = smp.unwrap_or(params.base_smp);
            let result = compute(*output, params, &interpolate(*output, rows), smp, overrides)?;
            let value = preview(&expression, &result)?;
            Report::Eval { expression, value }
        }
        Command::Translate { formula, to_code } => {
            let translator = tr.formula_translator();
            let translated = if *to_code {
                translator.to_code(formula)
            } else {
                translator.to_natural(formula)
            };
            Report::Translate {
                source: formula.clone(),
                translated,
            }
        }
    };
    Ok(report)
}
