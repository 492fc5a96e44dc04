//! proptest 기반 성질 테스트.

use biomass_dispatch::analysis::compute;
use biomass_dispatch::chart::{ChartData, SmpGrid};
use biomass_dispatch::curtailment::{find_curtailment_window, in_window, MIN_CURTAILMENT_HOURS};
use biomass_dispatch::formula::{evaluate, Context};
use biomass_dispatch::interpolation::interpolate;
use biomass_dispatch::model::{InputParameters, PlantRows, CALIBRATED_OUTPUTS};
use biomass_dispatch::threshold::sales_power_coefficient;
use proptest::prelude::*;

fn longest_run(prices: &[f64], threshold: f64) -> usize {
    let mut best = 0;
    let mut current = 0;
    for p in prices {
        if in_window(*p, threshold) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

proptest! {
    /// 보간값은 인접한 두 보정점 값 사이에 있다.
    #[test]
    fn interpolation_blends_adjacent_rows(output in 30.0f64..130.0) {
        let rows = PlantRows::default();
        let row = interpolate(output, &rows);
        let (upper, lower) = if output >= 80.0 {
            (rows.mw93, rows.mw80)
        } else {
            (rows.mw80, rows.mw65)
        };
        let between = |v: f64, a: f64, b: f64| v >= a.min(b) - 1e-12 && v <= a.max(b) + 1e-12;
        prop_assert!(between(
            row.transmission_efficiency,
            upper.transmission_efficiency,
            lower.transmission_efficiency
        ));
        prop_assert!(between(
            row.internal_consumption_rate,
            upper.internal_consumption_rate,
            lower.internal_consumption_rate
        ));
    }

    /// 공헌이익은 SMP 에 대해 1차식이며 기울기는 전력 판매 계수다.
    #[test]
    fn profit_slope_is_sales_power_coefficient(
        output in 65.0f64..93.0,
        a in 0.0f64..200.0,
        b in 0.0f64..200.0,
    ) {
        let params = InputParameters::default();
        let row = interpolate(output, &PlantRows::default());
        let profit = |smp: f64| compute(output, &params, &row, smp, None).map(|r| r.contribution_profit);
        let k = sales_power_coefficient(output, &row);
        let diff = profit(b).unwrap() - profit(a).unwrap();
        prop_assert!((diff - k * (b - a)).abs() < 1e-8);
    }

    /// 선택된 감발 구간은 최소 길이 이상이며 가장 긴 연속 구간이다.
    #[test]
    fn curtailment_window_is_longest_valid_run(
        prices in prop::array::uniform24(-10.0f64..150.0),
        threshold in 20.0f64..100.0,
        prev in prop::option::of(0.0f64..150.0),
    ) {
        let longest = longest_run(&prices, threshold);
        match find_curtailment_window(&prices, threshold, prev) {
            Some(w) => {
                prop_assert!(w.hours() >= MIN_CURTAILMENT_HOURS);
                prop_assert_eq!(w.hours(), longest);
                prop_assert!(w.prices.iter().all(|p| in_window(*p, threshold)));
                prop_assert_eq!(&w.prices[..], &prices[w.start_index..w.start_index + w.hours()]);
            }
            None => prop_assert!(longest < MIN_CURTAILMENT_HOURS),
        }
    }

    /// 우위 구간은 빈틈없이 0 부터 최대 SMP 까지 덮는다.
    #[test]
    fn dominance_zones_cover_the_axis(max_smp in 10.0f64..300.0, step in 0.5f64..5.0) {
        let grid = SmpGrid { max_smp, step };
        let data = ChartData::build(
            &CALIBRATED_OUTPUTS,
            &InputParameters::default(),
            &PlantRows::default(),
            &grid,
            None,
        )
        .unwrap();
        let zones = &data.zones;
        prop_assert!(!zones.is_empty());
        prop_assert_eq!(zones[0].start, 0.0);
        prop_assert_eq!(zones[zones.len() - 1].end, max_smp);
        for pair in zones.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
            prop_assert!(pair[0].dominant != pair[1].dominant);
        }
        let total: f64 = zones.iter().map(|z| z.width()).sum();
        prop_assert!((total - max_smp).abs() < 1e-6);
    }

    /// 임의 입력에도 평가기는 패닉 없이 결과나 오류를 돌려준다.
    #[test]
    fn evaluator_never_panics(src in "[0-9a-z+*/%()<>=!&|?: .-]{0,48}") {
        let mut ctx = Context::new();
        ctx.set("a", 1.0);
        ctx.set("b", 2.0);
        if let Ok(v) = evaluate(&src, &ctx) {
            prop_assert!(v.is_finite());
        }
    }
}

#[test]
fn deeply_nested_formula_is_rejected_not_overflowed() {
    let src = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    assert!(evaluate(&src, &Context::new()).is_err());
}

#[test]
fn long_operator_chain_is_rejected_not_overflowed() {
    let src = format!("1{}", "+1".repeat(100_000));
    assert!(evaluate(&src, &Context::new()).is_err());
}
