//! 기본 시나리오 기준점 회귀 테스트. 운영 중인 분석표에서 확인된 값을 쓴다.
use biomass_dispatch::analysis::{compute, preview, AnalysisError, Field, FormulaOverride, FormulaOverrideMap};
use biomass_dispatch::interpolation::interpolate;
use biomass_dispatch::model::{InputParameters, PlantRowInput, PlantRows};

fn assert_close(label: &str, actual: f64, expected: f64, rel_tol: f64) {
    let denom = expected.abs().max(1.0);
    let diff = (actual - expected).abs();
    assert!(
        diff <= rel_tol * denom,
        "{label} expected {expected:.6} got {actual:.6} (diff {diff:.6}, tol {rel_tol})"
    );
}

#[test]
fn nominal_output_at_150() {
    let params = InputParameters::default();
    let rows = PlantRows::default();
    let r = compute(93.0, &params, &rows.mw93, 150.0, None).expect("93MW");
    assert_close("transmissionAmount", r.transmission_amount, 85.188, 1e-9);
    assert_close("generationEfficiency", r.generation_efficiency, 33.187772925764186, 1e-9);
    assert_close("pksFuelConsumption", r.pks_fuel_consumption, 789.7042105263159, 1e-9);
    assert_close("wcCoFiringRate", r.wc_co_firing_rate.value(), 45.385254610595877, 1e-9);
    assert_close("totalGenerationCost", r.total_generation_cost, 102.9116184925148, 1e-9);
    assert_close("costChemical", r.cost_chemical, 15.5382912, 1e-9);
    assert_close("costFuel", r.cost_fuel, 210.40403894736843, 1e-9);
    assert_close("salesREC", r.sales_rec, 128.804256, 1e-9);
    assert_close("costWater", r.cost_water, 3.664556962025317, 1e-9);
    assert_close("contributionProfit", r.contribution_profit, 205.87416889060626, 1e-9);
    assert_close("hourlyExpectedProfit", r.hourly_expected_profit, 85.78090370441927, 1e-9);
    assert!(r.fallbacks.is_empty());
}

#[test]
fn reduced_outputs_at_150() {
    let params = InputParameters::default();
    let rows = PlantRows::default();
    let r80 = compute(80.0, &params, &rows.mw80, 150.0, None).expect("80MW");
    assert_close("transmissionAmount 80", r80.transmission_amount, 72.64, 1e-9);
    assert_close("chemicalCost 80", r80.chemical_cost, 8.39325, 1e-9);
    assert_close("costTotal 80", r80.cost_total, 186.74116663773, 1e-9);
    assert_close("contributionProfit 80", r80.contribution_profit, 184.59451336227002, 1e-9);

    let r65 = compute(65.0, &params, &rows.mw65, 150.0, None).expect("65MW");
    assert_close("transmissionAmount 65", r65.transmission_amount, 58.175, 1e-9);
    assert_close("contributionProfit 65", r65.contribution_profit, 156.4668006590273, 1e-9);
}

#[test]
fn contribution_profit_is_linear_in_smp() {
    let params = InputParameters::default();
    let row = interpolate(86.5, &PlantRows::default());
    let at = |smp: f64| compute(86.5, &params, &row, smp, None).expect("compute").contribution_profit;
    let (p0, p50, p100) = (at(0.0), at(50.0), at(100.0));
    assert_close("slope", p100 - p50, p50 - p0, 1e-9);
}

#[test]
fn broken_override_falls_back_and_is_reported() {
    let params = InputParameters::default();
    let row = PlantRowInput::new(30.4, 8.4);
    let baseline = compute(93.0, &params, &row, 150.0, None).expect("baseline");
    let overrides = FormulaOverrideMap::new()
        .with(Field::WaterFee, FormulaOverride::formula("waterFee_typo * 2"))
        .with(Field::CostChemical, FormulaOverride::formula("transmissionAmount * 0.1"));
    let r = compute(93.0, &params, &row, 150.0, Some(&overrides)).expect("with overrides");

    assert_eq!(r.fallbacks, vec![Field::WaterFee]);
    assert_close("waterFee", r.water_fee, baseline.water_fee, 1e-12);
    assert_close("costChemical", r.cost_chemical, 85.188 * 0.1, 1e-12);
    assert_close(
        "costTotal",
        r.cost_total,
        r.cost_fuel + r.cost_chemical + r.cost_water,
        1e-12,
    );
}

#[test]
fn override_reading_a_later_field_falls_back_instead_of_failing() {
    let params = InputParameters::default();
    let row = PlantRowInput::new(30.4, 8.4);
    let overrides = FormulaOverrideMap::new()
        .with(Field::PksFuelConsumption, FormulaOverride::formula("costFuel * 2"));
    overrides.validate().expect("no override cycle");
    let r = compute(93.0, &params, &row, 150.0, Some(&overrides)).expect("with overrides");

    assert_eq!(r.fallbacks, vec![Field::PksFuelConsumption]);
    assert_close("pksFuelConsumption", r.pks_fuel_consumption, 789.7042105263159, 1e-9);
    assert_close("contributionProfit", r.contribution_profit, 205.87416889060626, 1e-9);
}

#[test]
fn co_firing_override_is_given_in_percent() {
    let params = InputParameters::default();
    let overrides = FormulaOverrideMap::new().with(Field::WcCoFiringRate, FormulaOverride::fixed(50.0));
    let r = compute(93.0, &params, &PlantRows::default().mw93, 150.0, Some(&overrides)).expect("compute");
    assert_eq!(r.wc_co_firing_rate.value(), 50.0);
    assert_close(
        "totalGenerationCost",
        r.total_generation_cost,
        0.5 * r.pks_generation_cost + 0.5 * r.wc_generation_cost,
        1e-12,
    );
}

#[test]
fn preview_sees_inputs_and_fields() {
    let r = compute(93.0, &InputParameters::default(), &PlantRows::default().mw93, 150.0, None).expect("compute");
    let v = preview("contributionProfit > 0 ? salesTotal - costTotal : 0", &r).expect("preview");
    assert_close("preview", v, r.contribution_profit, 1e-12);
    let pct = preview("wcCoFiringRate", &r).expect("co-firing");
    assert_close("co-firing percent", pct, 45.385254610595877, 1e-9);
    assert!(preview("output(1)", &r).is_err());
}

#[test]
fn degenerate_inputs_are_rejected() {
    let params = InputParameters::default();
    let rows = PlantRows::default();
    assert!(matches!(
        compute(0.0, &params, &rows.mw93, 150.0, None),
        Err(AnalysisError::DegenerateInput(_))
    ));
    assert!(matches!(
        compute(93.0, &params, &PlantRowInput::new(30.4, 100.0), 150.0, None),
        Err(AnalysisError::DegenerateInput(_))
    ));
    assert!(matches!(
        compute(93.0, &params, &rows.mw93, f64::NAN, None),
        Err(AnalysisError::InvalidInput { name: "smp", .. })
    ));
}
