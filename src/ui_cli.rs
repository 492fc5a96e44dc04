//! 계산 결과를 터미널 표/JSON 으로 그린다.

use std::fmt::Write;

use serde::Serialize;

use crate::analysis::{AnalysisResult, Field};
use crate::chart::{ChartData, Dominant};
use crate::curtailment::CurtailmentSummary;
use crate::i18n::{keys, Translator};
use crate::threshold::{Threshold, Thresholds};

/// 명령 하나의 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "camelCase")]
pub enum Report {
    Analysis { smp: f64, results: Vec<AnalysisResult> },
    Thresholds(Thresholds),
    Chart(ChartData),
    Curtailment(CurtailmentSummary),
    Eval { expression: String, value: f64 },
    Translate { source: String, translated: String },
}

pub fn render_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// 사람이 읽는 형식으로 결과를 만든다.
pub fn render(report: &Report, tr: &Translator) -> String {
    let mut out = String::new();
    // String 에 쓰는 write! 는 실패하지 않는다.
    let _ = match report {
        Report::Analysis { smp, results } => write_analysis(&mut out, tr, *smp, results),
        Report::Thresholds(t) => write_thresholds(&mut out, tr, t),
        Report::Chart(data) => write_chart(&mut out, tr, data),
        Report::Curtailment(summary) => write_curtailment(&mut out, tr, summary),
        Report::Eval { value, .. } => writeln!(out, "{} {value:.6}", tr.t(keys::EVAL_RESULT)),
        Report::Translate { translated, .. } => {
            writeln!(out, "{} {translated}", tr.t(keys::TRANSLATE_RESULT))
        }
    };
    out
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

fn dominant_label(tr: &Translator, d: Dominant) -> String {
    match d {
        Dominant::Output(mw) => format!("{mw}MW"),
        Dominant::Stopped => tr.t(keys::ZONE_STOPPED).to_string(),
    }
}

fn threshold_text(tr: &Translator, t: Threshold) -> String {
    match t {
        Threshold::At(v) => format!("{v:.2}"),
        Threshold::NoCrossover => tr.t(keys::NOT_AVAILABLE).to_string(),
    }
}

fn write_analysis(out: &mut String, tr: &Translator, smp: f64, results: &[AnalysisResult]) -> std::fmt::Result {
    writeln!(out, "\n=== {} (SMP {smp}) ===", tr.t(keys::ANALYSIS_HEADING))?;
    let label_width = Field::ALL
        .iter()
        .map(|f| tr.label(f.code()).chars().count())
        .max()
        .unwrap_or(0)
        .max(tr.t(keys::ANALYSIS_COLUMN_ITEM).chars().count());

    write!(
        out,
        "{} {}",
        pad(tr.t(keys::ANALYSIS_COLUMN_ITEM), label_width),
        pad(tr.t(keys::ANALYSIS_COLUMN_UNIT), 10)
    )?;
    for r in results {
        write!(out, "{:>14}", format!("{}MW", r.output))?;
    }
    writeln!(out)?;

    for field in Field::ALL {
        write!(
            out,
            "{} {}",
            pad(tr.label(field.code()), label_width),
            pad(field.unit(), 10)
        )?;
        for r in results {
            write!(out, "{:>14.3}", r.get(field))?;
        }
        writeln!(out)?;
    }

    for r in results.iter().filter(|r| !r.fallbacks.is_empty()) {
        let names: Vec<&str> = r.fallbacks.iter().map(|f| tr.label(f.code())).collect();
        writeln!(
            out,
            "{}MW {} {}",
            r.output,
            tr.t(keys::ANALYSIS_FALLBACK_NOTE),
            names.join(", ")
        )?;
    }
    Ok(())
}

fn write_thresholds(out: &mut String, tr: &Translator, t: &Thresholds) -> std::fmt::Result {
    writeln!(out, "\n=== {} ===", tr.t(keys::THRESHOLD_HEADING))?;
    for (key, value) in [
        (keys::THRESHOLD_80MW, t.threshold_80mw),
        (keys::THRESHOLD_65MW, t.threshold_65mw),
        (keys::THRESHOLD_STOP, t.threshold_stop),
    ] {
        writeln!(out, "{}: {} 원/kWh", tr.t(key), threshold_text(tr, value))?;
    }
    Ok(())
}

fn write_chart(out: &mut String, tr: &Translator, data: &ChartData) -> std::fmt::Result {
    writeln!(out, "\n=== {} ===", tr.t(keys::CHART_HEADING))?;
    writeln!(out, "{}:", tr.t(keys::CHART_INTERSECTIONS))?;
    if data.intersections.is_empty() {
        writeln!(out, "  {}", tr.t(keys::CHART_NO_INTERSECTIONS))?;
    }
    for x in &data.intersections {
        writeln!(
            out,
            "  {}MW / {}MW: SMP {:.2}, {:.3}",
            x.output_a, x.output_b, x.smp, x.profit
        )?;
    }
    writeln!(out, "{}:", tr.t(keys::CHART_ZONES))?;
    for z in &data.zones {
        writeln!(
            out,
            "  {:>7.2} ~ {:>7.2}  {}",
            z.start,
            z.end,
            dominant_label(tr, z.dominant)
        )?;
    }
    Ok(())
}

fn write_curtailment(out: &mut String, tr: &Translator, s: &CurtailmentSummary) -> std::fmt::Result {
    writeln!(out, "\n=== {} (SMP <= {:.2}) ===", tr.t(keys::CURTAILMENT_HEADING), s.threshold)?;
    for day in &s.days {
        match (&day.window, &day.economics) {
            (Some(w), Some(e)) => {
                write!(
                    out,
                    "{}  {:02}~{:02}h ({}h, SMP {:.2})",
                    day.date,
                    w.start_hour(),
                    w.end_hour(),
                    w.hours(),
                    w.average_price()
                )?;
                if w.continues_from_previous_day {
                    write!(out, " {}", tr.t(keys::CURTAILMENT_CONTINUES))?;
                }
                writeln!(
                    out,
                    "  {}: {}, {}: {:.3}",
                    tr.t(keys::CURTAILMENT_BEST),
                    dominant_label(tr, e.best),
                    tr.t(keys::CURTAILMENT_GAIN),
                    e.gain_over_nominal
                )?;
            }
            _ => writeln!(out, "{}  {}", day.date, tr.t(keys::CURTAILMENT_NONE))?,
        }
    }
    writeln!(out, "{}: {} / {}", tr.t(keys::CURTAILMENT_DAYS), s.curtailed_days, s.days.len())?;
    writeln!(out, "{}: {}", tr.t(keys::CURTAILMENT_HOURS), s.total_hours)?;
    let avg = s
        .average_price
        .map_or_else(|| tr.t(keys::NOT_AVAILABLE).to_string(), |p| format!("{p:.2}"));
    writeln!(out, "{}: {avg}", tr.t(keys::CURTAILMENT_AVERAGE_PRICE))?;
    writeln!(out, "{}: {:.3}", tr.t(keys::CURTAILMENT_TOTAL_GAIN), s.total_gain)?;
    Ok(())
}
