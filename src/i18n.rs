use std::collections::HashMap;
use std::fs;
use std::path::Path;
use sys_locale::get_locale;

use crate::analysis::{input, Field};
use crate::formula::{is_ident_continue, is_ident_start};

/// 문자열 키를 모아두는 네임스페이스.
pub mod keys {
    pub const ERROR_PREFIX: &str = "general.error_prefix";
    pub const NOT_AVAILABLE: &str = "general.not_available";

    pub const ANALYSIS_HEADING: &str = "analysis.heading";
    pub const ANALYSIS_COLUMN_ITEM: &str = "analysis.column_item";
    pub const ANALYSIS_COLUMN_UNIT: &str = "analysis.column_unit";
    pub const ANALYSIS_FALLBACK_NOTE: &str = "analysis.fallback_note";

    pub const THRESHOLD_HEADING: &str = "threshold.heading";
    pub const THRESHOLD_80MW: &str = "threshold.mw80";
    pub const THRESHOLD_65MW: &str = "threshold.mw65";
    pub const THRESHOLD_STOP: &str = "threshold.stop";

    pub const CHART_HEADING: &str = "chart.heading";
    pub const CHART_INTERSECTIONS: &str = "chart.intersections";
    pub const CHART_NO_INTERSECTIONS: &str = "chart.no_intersections";
    pub const CHART_ZONES: &str = "chart.zones";
    pub const ZONE_STOPPED: &str = "chart.zone_stopped";

    pub const CURTAILMENT_HEADING: &str = "curtailment.heading";
    pub const CURTAILMENT_NONE: &str = "curtailment.none";
    pub const CURTAILMENT_CONTINUES: &str = "curtailment.continues";
    pub const CURTAILMENT_BEST: &str = "curtailment.best";
    pub const CURTAILMENT_GAIN: &str = "curtailment.gain";
    pub const CURTAILMENT_DAYS: &str = "curtailment.days";
    pub const CURTAILMENT_HOURS: &str = "curtailment.hours";
    pub const CURTAILMENT_AVERAGE_PRICE: &str = "curtailment.average_price";
    pub const CURTAILMENT_TOTAL_GAIN: &str = "curtailment.total_gain";

    pub const EVAL_RESULT: &str = "eval.result";
    pub const TRANSLATE_RESULT: &str = "translate.result";

    /// 변수 라벨 키 접두어 (`label.<변수코드>`)
    pub const LABEL_PREFIX: &str = "label.";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Ko,
    En,
}

impl Language {
    fn from_code(code: &str) -> Self {
        let c = code.to_lowercase();
        if c.starts_with("en") {
            Language::En
        } else {
            Language::Ko
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
        }
    }
}

/// 런타임 언어 번들을 제공한다.
#[derive(Debug, Clone)]
pub struct Translator {
    lang: Language,
    overrides: Option<HashMap<String, String>>,
}

impl Translator {
    /// 언어 코드(ko/en)에 따라 번역기를 생성한다. 알 수 없는 코드는 ko로 폴백한다.
    pub fn new(lang_code: &str) -> Self {
        Self {
            lang: Language::from_code(lang_code),
            overrides: None,
        }
    }

    /// 언어 코드 + 언어팩 디렉터리(locales/ 등)를 받아서 번역기를 생성한다.
    /// 디렉터리가 없거나 파일이 없으면 내장 문자열만 사용한다.
    pub fn new_with_pack(lang_code: &str, pack_dir: Option<&str>) -> Self {
        let overrides = pack_dir
            .and_then(|dir| load_overrides(dir, lang_code))
            .or_else(|| load_overrides("locales", lang_code));
        Self {
            lang: Language::from_code(lang_code),
            overrides,
        }
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    /// 번역을 가져온다. 언어팩 → 내장 문자열 순이며 영어 번역이 없으면 한국어로 폴백한다.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        if let Some(v) = self.overrides.as_ref().and_then(|m| m.get(key)) {
            return v;
        }
        let builtin = match self.lang {
            Language::En => en(key).or_else(|| ko(key)),
            Language::Ko => ko(key),
        };
        builtin.unwrap_or(key)
    }

    /// 변수 코드의 표시 라벨. 모르는 코드는 그대로 돌려준다.
    pub fn label<'a>(&'a self, code: &'a str) -> &'a str {
        let key = format!("{}{code}", keys::LABEL_PREFIX);
        if let Some(v) = self.overrides.as_ref().and_then(|m| m.get(&key)) {
            return v;
        }
        let builtin = match self.lang {
            Language::En => en_label(code).or_else(|| ko_label(code)),
            Language::Ko => ko_label(code),
        };
        builtin.unwrap_or(code)
    }

    /// 수식 번역기를 만든다.
    pub fn formula_translator(&self) -> FormulaTranslator {
        let pairs = all_variable_codes()
            .map(|code| (code.to_string(), self.label(code).to_string()))
            .collect();
        FormulaTranslator::new(pairs)
    }
}

/// 원시 입력 변수 + 파생 항목 코드 (평가 순서).
pub fn all_variable_codes() -> impl Iterator<Item = &'static str> {
    input::ALL
        .into_iter()
        .chain(Field::ALL.into_iter().map(Field::code))
}

/// 변수 코드 ↔ 표시 라벨 수식 변환.
///
/// 라벨이 다른 라벨의 일부이거나(예: "약품비" / "약품비단가") 식별자 안에 끼어 있는
/// 경우에도 식별자 경계에서만 치환한다.
#[derive(Debug, Clone)]
pub struct FormulaTranslator {
    code_to_label: HashMap<String, String>,
    /// 긴 라벨 우선
    labels: Vec<(String, String)>,
}

impl FormulaTranslator {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        let mut labels: Vec<(String, String)> = pairs
            .iter()
            .map(|(code, label)| (label.clone(), code.clone()))
            .collect();
        labels.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Self {
            code_to_label: pairs.into_iter().collect(),
            labels,
        }
    }

    /// 수식 속 변수 코드를 라벨로 바꾼다. 코드가 아닌 식별자는 그대로 둔다.
    pub fn to_natural(&self, formula: &str) -> String {
        let chars: Vec<char> = formula.chars().collect();
        let mut out = String::with_capacity(formula.len());
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            // 1e5 의 e 처럼 숫자에 붙은 문자는 식별자가 아니다
            let inside_word = i > 0 && is_ident_continue(chars[i - 1]);
            if is_ident_start(c) && !inside_word {
                let start = i;
                while i < chars.len() && is_ident_continue(chars[i]) {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                match self.code_to_label.get(&ident) {
                    Some(label) => out.push_str(label),
                    None => out.push_str(&ident),
                }
            } else {
                out.push(c);
                i += 1;
            }
        }
        out
    }

    /// 라벨로 쓴 수식을 변수 코드 수식으로 되돌린다.
    pub fn to_code(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        'scan: while i < chars.len() {
            let at_boundary = i == 0 || !is_ident_continue(chars[i - 1]);
            if at_boundary {
                for (label, code) in &self.labels {
                    let label_chars: Vec<char> = label.chars().collect();
                    let end = i + label_chars.len();
                    if label_chars.is_empty() || end > chars.len() || chars[i..end] != label_chars[..] {
                        continue;
                    }
                    let ends_at_boundary = end == chars.len()
                        || !is_ident_continue(chars[end])
                        || !label_chars.last().is_some_and(|c| is_ident_continue(*c));
                    if ends_at_boundary {
                        out.push_str(code);
                        i = end;
                        continue 'scan;
                    }
                }
                if is_ident_start(chars[i]) {
                    // 라벨이 아닌 식별자는 통째로 복사해 중간에서 라벨이 잡히지 않게 한다.
                    while i < chars.len() && is_ident_continue(chars[i]) {
                        out.push(chars[i]);
                        i += 1;
                    }
                    continue;
                }
            }
            out.push(chars[i]);
            i += 1;
        }
        out
    }
}

/// CLI 플래그/설정/시스템 순으로 언어 코드를 결정한다.
pub fn resolve_language(cli_arg: &str, config_lang: Option<&str>) -> String {
    normalize_lang(cli_arg)
        .or_else(|| config_lang.and_then(normalize_lang))
        .or_else(detect_system_language)
        .unwrap_or_else(|| "ko".to_string())
}

fn normalize_lang(code: &str) -> Option<String> {
    let c = code.trim().to_lowercase();
    match c.as_str() {
        "auto" | "" => None,
        other if other.starts_with("ko") => Some("ko".into()),
        other if other.starts_with("en") => Some("en".into()),
        _ => None,
    }
}

fn normalize_locale_string(loc: &str) -> Option<String> {
    let lang = loc
        .split(['.', '_', '-'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match lang.as_str() {
        "ko" => Some("ko".into()),
        "en" => Some("en".into()),
        _ => None,
    }
}

/// 시스템 로케일에서 언어를 추정한다.
pub fn detect_system_language() -> Option<String> {
    if let Some(lang) = get_locale().as_deref().and_then(normalize_locale_string) {
        return Some(lang);
    }
    ["LANG", "LC_ALL"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|v| normalize_locale_string(&v))
}

/// TOML 기반 언어팩을 로드한다. 형식: key = "value" 로 구성된 플랫 맵(테이블은 점으로 연결).
fn load_overrides(dir: &str, lang: &str) -> Option<HashMap<String, String>> {
    let path = Path::new(dir).join(format!("{lang}.toml"));
    let content = fs::read_to_string(path).ok()?;
    parse_toml_to_map(&content)
}

fn parse_toml_to_map(src: &str) -> Option<HashMap<String, String>> {
    let value: toml::Value = toml::from_str(src).ok()?;
    let table = value.as_table()?;
    let mut map = HashMap::new();

    fn walk(prefix: &str, val: &toml::Value, out: &mut HashMap<String, String>) {
        match val {
            toml::Value::String(s) => {
                out.insert(prefix.to_string(), s.to_string());
            }
            toml::Value::Table(t) => {
                for (k, v) in t {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    walk(&key, v, out);
                }
            }
            _ => {}
        }
    }

    for (k, v) in table {
        walk(k, v, &mut map);
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn ko(key: &str) -> Option<&'static str> {
    use keys::*;
    let s = match key {
        ERROR_PREFIX => "오류",
        NOT_AVAILABLE => "-",
        ANALYSIS_HEADING => "출력별 공헌이익 분석",
        ANALYSIS_COLUMN_ITEM => "항목",
        ANALYSIS_COLUMN_UNIT => "단위",
        ANALYSIS_FALLBACK_NOTE => "재정의 수식 오류로 기본값을 사용한 항목:",
        THRESHOLD_HEADING => "감발 기준 SMP",
        THRESHOLD_80MW => "80MW 감발 기준",
        THRESHOLD_65MW => "65MW 감발 기준",
        THRESHOLD_STOP => "정지 기준",
        CHART_HEADING => "SMP별 공헌이익",
        CHART_INTERSECTIONS => "교차점",
        CHART_NO_INTERSECTIONS => "교차점 없음",
        CHART_ZONES => "우위 구간",
        ZONE_STOPPED => "정지",
        CURTAILMENT_HEADING => "감발 구간 분석",
        CURTAILMENT_NONE => "감발 구간 없음",
        CURTAILMENT_CONTINUES => "(전날부터 연속)",
        CURTAILMENT_BEST => "최선 운전",
        CURTAILMENT_GAIN => "정격 대비 이익",
        CURTAILMENT_DAYS => "감발 일수",
        CURTAILMENT_HOURS => "감발 시간",
        CURTAILMENT_AVERAGE_PRICE => "감발 구간 평균 SMP",
        CURTAILMENT_TOTAL_GAIN => "정격 대비 총 이익",
        EVAL_RESULT => "계산 결과:",
        TRANSLATE_RESULT => "변환 결과:",
        _ => return None,
    };
    Some(s)
}

fn en(key: &str) -> Option<&'static str> {
    use keys::*;
    let s = match key {
        ERROR_PREFIX => "Error",
        NOT_AVAILABLE => "-",
        ANALYSIS_HEADING => "Contribution profit by output",
        ANALYSIS_COLUMN_ITEM => "Item",
        ANALYSIS_COLUMN_UNIT => "Unit",
        ANALYSIS_FALLBACK_NOTE => "Fields computed with defaults after an override error:",
        THRESHOLD_HEADING => "Curtailment SMP thresholds",
        THRESHOLD_80MW => "80MW threshold",
        THRESHOLD_65MW => "65MW threshold",
        THRESHOLD_STOP => "Stop threshold",
        CHART_HEADING => "Contribution profit by SMP",
        CHART_INTERSECTIONS => "Intersections",
        CHART_NO_INTERSECTIONS => "No intersections",
        CHART_ZONES => "Dominance zones",
        ZONE_STOPPED => "Stopped",
        CURTAILMENT_HEADING => "Curtailment windows",
        CURTAILMENT_NONE => "No curtailment window",
        CURTAILMENT_CONTINUES => "(continues from previous day)",
        CURTAILMENT_BEST => "Best operation",
        CURTAILMENT_GAIN => "Gain over nominal",
        CURTAILMENT_DAYS => "Curtailed days",
        CURTAILMENT_HOURS => "Curtailed hours",
        CURTAILMENT_AVERAGE_PRICE => "Average SMP in windows",
        CURTAILMENT_TOTAL_GAIN => "Total gain over nominal",
        EVAL_RESULT => "Result:",
        TRANSLATE_RESULT => "Translated:",
        _ => return None,
    };
    Some(s)
}

fn ko_label(code: &str) -> Option<&'static str> {
    let s = match code {
        "output" => "출력",
        "smp" => "SMP",
        "baseSMP" => "기준SMP",
        "transmissionEfficiency" => "송전효율",
        "internalConsumptionRate" => "소내소비율",
        "pksCalorificValue" => "PKS발열량",
        "wcCalorificValue" => "WC발열량",
        "pksUnitPrice" => "PKS단가",
        "wcUnitPrice" => "WC단가",
        "transmissionAmount" => "송전량",
        "generationEfficiency" => "발전효율",
        "wcFuelConsumption" => "WC사용량",
        "pksFuelConsumption" => "PKS사용량",
        "wcCoFiringRate" => "WC혼소율",
        "pksGenerationCost" => "PKS발전단가",
        "wcGenerationCost" => "WC발전단가",
        "totalGenerationCost" => "혼소발전단가",
        "chemicalCost" => "약품비단가",
        "waterFee" => "용수요금단가",
        "salesPower" => "전력판매",
        "salesREC" => "REC판매",
        "salesTotal" => "매출합계",
        "costFuel" => "연료비",
        "costChemical" => "약품비",
        "costWater" => "용수비",
        "costTotal" => "비용합계",
        "contributionProfit" => "공헌이익",
        "hourlyExpectedProfit" => "시간당예상이익",
        _ => return None,
    };
    Some(s)
}

fn en_label(code: &str) -> Option<&'static str> {
    let s = match code {
        "output" => "Output",
        "smp" => "SMP",
        "baseSMP" => "Base SMP",
        "transmissionEfficiency" => "Transmission efficiency",
        "internalConsumptionRate" => "Internal consumption rate",
        "pksCalorificValue" => "PKS calorific value",
        "wcCalorificValue" => "WC calorific value",
        "pksUnitPrice" => "PKS unit price",
        "wcUnitPrice" => "WC unit price",
        "transmissionAmount" => "Transmission amount",
        "generationEfficiency" => "Generation efficiency",
        "wcFuelConsumption" => "WC consumption",
        "pksFuelConsumption" => "PKS consumption",
        "wcCoFiringRate" => "WC co-firing rate",
        "pksGenerationCost" => "PKS generation cost",
        "wcGenerationCost" => "WC generation cost",
        "totalGenerationCost" => "Blended generation cost",
        "chemicalCost" => "Chemical unit cost",
        "waterFee" => "Water unit fee",
        "salesPower" => "Power sales",
        "salesREC" => "REC sales",
        "salesTotal" => "Total sales",
        "costFuel" => "Fuel cost",
        "costChemical" => "Chemical cost",
        "costWater" => "Water cost",
        "costTotal" => "Total cost",
        "contributionProfit" => "Contribution profit",
        "hourlyExpectedProfit" => "Expected hourly profit",
        _ => return None,
    };
    Some(s)
}
