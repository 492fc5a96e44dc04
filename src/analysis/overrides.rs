use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::field::Field;
use super::AnalysisError;
use crate::formula::Formula;

/// 항목 하나의 사용자 재정의.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FormulaOverride {
    /// 고정값
    Fixed {
        #[serde(rename = "fixedValue")]
        fixed_value: f64,
    },
    /// 다른 항목/입력을 참조하는 수식
    Formula { formula: String },
}

impl FormulaOverride {
    pub fn fixed(value: f64) -> Self {
        FormulaOverride::Fixed { fixed_value: value }
    }

    pub fn formula(src: impl Into<String>) -> Self {
        FormulaOverride::Formula {
            formula: src.into(),
        }
    }
}

/// 항목별 재정의 모음.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormulaOverrideMap {
    entries: BTreeMap<Field, FormulaOverride>,
}

impl FormulaOverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: FormulaOverride) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: FormulaOverride) {
        self.entries.insert(field, value);
    }

    pub fn remove(&mut self, field: Field) -> Option<FormulaOverride> {
        self.entries.remove(&field)
    }

    pub fn get(&self, field: Field) -> Option<&FormulaOverride> {
        self.entries.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FormulaOverride)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 재정의 수식이 참조하는 항목 중 역시 수식으로 재정의된 항목.
    ///
    /// 순환은 재정의 수식끼리의 참조로만 생긴다. 기본 계산식은 선언 순서상 앞선
    /// 항목만 읽고, 재정의 수식이 뒤쪽 항목을 읽으면 평가 시점에 변수가 없어
    /// 기본값으로 돌아가므로 순환이 되지 않는다.
    fn override_dependencies(&self, field: Field) -> BTreeSet<Field> {
        let Some(FormulaOverride::Formula { formula }) = self.entries.get(&field) else {
            return BTreeSet::new();
        };
        let Ok(parsed) = Formula::parse(formula) else {
            return BTreeSet::new();
        };
        parsed
            .variables()
            .iter()
            .filter_map(|code| Field::from_code(code))
            .filter(|dep| matches!(self.entries.get(dep), Some(FormulaOverride::Formula { .. })))
            .collect()
    }

    /// 고정값이 유한한지, 재정의가 자기 자신이나 순환 참조를 만들지 않는지 검사한다.
    ///
    /// 아직 계산되지 않은 뒤쪽 항목을 참조하는 것 자체는 오류가 아니다. 평가 시점에
    /// 해당 변수가 없으므로 기본값으로 돌아간다. 기본 계산식을 거쳐 되돌아오는
    /// 참조도 같은 이유로 허용한다.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (field, value) in &self.entries {
            if let FormulaOverride::Fixed { fixed_value } = value {
                if !fixed_value.is_finite() {
                    return Err(AnalysisError::InvalidOverride {
                        field: *field,
                        reason: format!("고정값이 유한하지 않음: {fixed_value}"),
                    });
                }
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        fn visit(
            map: &FormulaOverrideMap,
            field: Field,
            marks: &mut [Mark; 19],
            stack: &mut Vec<Field>,
        ) -> Result<(), AnalysisError> {
            match marks[field.index()] {
                Mark::Done => return Ok(()),
                Mark::Active => {
                    let start = stack.iter().position(|f| *f == field).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|f| f.code().to_string()).collect();
                    cycle.push(field.code().to_string());
                    return Err(AnalysisError::OverrideCycle(cycle));
                }
                Mark::Unvisited => {}
            }
            marks[field.index()] = Mark::Active;
            stack.push(field);
            for dep in map.override_dependencies(field) {
                visit(map, dep, marks, stack)?;
            }
            stack.pop();
            marks[field.index()] = Mark::Done;
            Ok(())
        }

        let mut marks = [Mark::Unvisited; 19];
        let mut stack = Vec::new();
        for field in self.entries.keys() {
            visit(self, *field, &mut marks, &mut stack)?;
        }
        Ok(())
    }
}

impl FromIterator<(Field, FormulaOverride)> for FormulaOverrideMap {
    fn from_iter<T: IntoIterator<Item = (Field, FormulaOverride)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_reference_is_rejected() {
        let map = FormulaOverrideMap::new().with(
            Field::ChemicalCost,
            FormulaOverride::formula("chemicalCost * 1.1"),
        );
        assert_eq!(
            map.validate(),
            Err(AnalysisError::OverrideCycle(vec![
                "chemicalCost".into(),
                "chemicalCost".into()
            ]))
        );
    }

    #[test]
    fn reference_through_default_formula_is_not_a_cycle() {
        // generationEfficiency 기본식은 pksFuelConsumption 을 읽지 않는다.
        let map = FormulaOverrideMap::new().with(
            Field::GenerationEfficiency,
            FormulaOverride::formula("pksFuelConsumption / 20"),
        );
        assert!(map.validate().is_ok());

        let map = FormulaOverrideMap::new().with(
            Field::PksFuelConsumption,
            FormulaOverride::formula("costFuel * 2"),
        );
        assert!(map.validate().is_ok());
    }

    #[test]
    fn cycle_between_override_formulas_is_rejected() {
        let map = FormulaOverrideMap::new()
            .with(Field::GenerationEfficiency, FormulaOverride::formula("pksFuelConsumption / 20"))
            .with(Field::PksFuelConsumption, FormulaOverride::formula("generationEfficiency * 20"));
        match map.validate() {
            Err(AnalysisError::OverrideCycle(path)) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 3);
                assert!(path.contains(&"pksFuelConsumption".to_string()));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn unparsable_override_formula_has_no_edges() {
        let map = FormulaOverrideMap::new()
            .with(Field::WaterFee, FormulaOverride::formula("costWater +"))
            .with(Field::CostWater, FormulaOverride::formula("waterFee * 2"));
        assert!(map.validate().is_ok());
    }

    #[test]
    fn forward_reference_without_cycle_is_allowed() {
        let map = FormulaOverrideMap::new().with(
            Field::TransmissionAmount,
            FormulaOverride::formula("salesPower / smp"),
        );
        assert!(map.validate().is_ok());
    }

    #[test]
    fn fixed_override_breaks_dependency_chain() {
        let map = FormulaOverrideMap::new()
            .with(Field::GenerationEfficiency, FormulaOverride::formula("pksFuelConsumption / 20"))
            .with(Field::PksFuelConsumption, FormulaOverride::fixed(600.0));
        assert!(map.validate().is_ok());
    }

    #[test]
    fn non_finite_fixed_value_is_rejected() {
        let map = FormulaOverrideMap::new().with(Field::WaterFee, FormulaOverride::fixed(f64::NAN));
        assert!(matches!(
            map.validate(),
            Err(AnalysisError::InvalidOverride { field: Field::WaterFee, .. })
        ));
    }

    #[test]
    fn deserializes_mode_tagged_entries() {
        let src = r#"
            [chemicalCost]
            mode = "fixed"
            fixedValue = 7.0

            [waterFee]
            mode = "formula"
            formula = "transmissionAmount / 50"
        "#;
        let map: FormulaOverrideMap = toml::from_str(src).unwrap();
        assert_eq!(map.get(Field::ChemicalCost), Some(&FormulaOverride::fixed(7.0)));
        assert_eq!(
            map.get(Field::WaterFee),
            Some(&FormulaOverride::formula("transmissionAmount / 50"))
        );
        assert!(toml::from_str::<FormulaOverrideMap>("[noSuchField]\nmode = \"fixed\"\nfixedValue = 1.0").is_err());
    }
}
