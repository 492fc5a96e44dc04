use biomass_dispatch::chart::Dominant;
use biomass_dispatch::curtailment::{find_curtailment_window, summarize, summarize_with};
use biomass_dispatch::model::{DailySmpData, HourlySmpData, InputParameters, PlantRows};
use chrono::NaiveDate;

const THRESHOLD: f64 = 44.1156655181546;

fn day(date: &str, ranges: &[(usize, usize, f64)]) -> DailySmpData {
    let mut hourly_prices = [120.0; 24];
    for &(s, e, p) in ranges {
        for slot in &mut hourly_prices[s..e] {
            *slot = p;
        }
    }
    DailySmpData {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("date"),
        hourly_prices,
    }
}

#[test]
fn night_run_continues_into_next_morning() {
    let prev = day("2024-03-01", &[(18, 24, 30.0)]);
    let today = day("2024-03-02", &[(0, 8, 30.0), (12, 20, 40.0)]);
    let w = find_curtailment_window(&today.hourly_prices, THRESHOLD, Some(prev.last_hour_price())).expect("window");
    assert_eq!(w.start_index, 0);
    assert_eq!(w.hours(), 8);
    assert!(w.continues_from_previous_day);
}

#[test]
fn summary_uses_previous_day_only_when_consecutive() {
    let data = HourlySmpData::new(vec![
        day("2024-03-04", &[(0, 8, 30.0)]),
        day("2024-03-01", &[(18, 24, 30.0)]),
        day("2024-03-02", &[(0, 8, 30.0), (12, 20, 40.0)]),
    ]);
    let summary = summarize(&data, THRESHOLD, &InputParameters::default(), &PlantRows::default(), None)
        .expect("summary");

    let flags: Vec<Option<bool>> = summary
        .days
        .iter()
        .map(|d| d.window.as_ref().map(|w| w.continues_from_previous_day))
        .collect();
    assert_eq!(flags, vec![Some(false), Some(true), Some(false)]);
    assert_eq!(summary.curtailed_days, 3);
    assert_eq!(summary.total_hours, 22);
    assert_eq!(summary.average_price, Some(30.0));

    // SMP 30 은 모든 출력의 손익분기보다 낮으므로 정지가 최선이다.
    for d in &summary.days {
        let econ = d.economics.expect("economics");
        assert_eq!(econ.best, Dominant::Stopped);
        assert!(econ.gain_over_nominal > 0.0);
    }
    let total: f64 = summary
        .days
        .iter()
        .filter_map(|d| d.economics.map(|e| e.gain_over_nominal))
        .sum();
    assert!((summary.total_gain - total).abs() < 1e-9);
}

#[test]
fn reduced_output_wins_between_thresholds() {
    // 65MW 정지 기준(37.9)과 80MW 손익분기(44.1) 사이: 65MW 만 이익
    let data = HourlySmpData::new(vec![day("2024-06-01", &[(2, 10, 42.0)])]);
    let summary = summarize(&data, 43.0, &InputParameters::default(), &PlantRows::default(), None)
        .expect("summary");
    let econ = summary.days[0].economics.expect("economics");
    assert_eq!(econ.best, Dominant::Output(65.0));
    assert!(econ.profit_65 > 0.0);
    assert!(econ.profit_93 < 0.0);
}

#[test]
fn days_without_window_are_kept_in_summary() {
    let data = HourlySmpData::new(vec![day("2024-06-01", &[(2, 5, 20.0)])]);
    let summary = summarize_with(&data, 50.0, 6, &InputParameters::default(), &PlantRows::default(), None)
        .expect("summary");
    assert_eq!(summary.days.len(), 1);
    assert!(summary.days[0].window.is_none());
    assert_eq!(summary.average_price, None);
    assert_eq!(summary.total_gain, 0.0);

    let relaxed = summarize_with(&data, 50.0, 3, &InputParameters::default(), &PlantRows::default(), None)
        .expect("relaxed");
    assert_eq!(relaxed.total_hours, 3);
}

#[test]
fn price_file_json_round_trips_through_summary() {
    let prices: Vec<String> = (0..24).map(|h| if h < 6 { "35.5".into() } else { "110".into() }).collect();
    let json = format!(r#"[{{"date": "2024-01-15", "hourlyPrices": [{}]}}]"#, prices.join(", "));
    let data = HourlySmpData::from_json_str(&json).expect("json");
    let summary = summarize(&data, 40.0, &InputParameters::default(), &PlantRows::default(), None)
        .expect("summary");
    let w = summary.days[0].window.as_ref().expect("window");
    assert_eq!((w.start_hour(), w.end_hour()), (1, 6));
    assert!(!w.continues_from_previous_day);
}
