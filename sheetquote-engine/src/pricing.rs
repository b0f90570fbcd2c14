use std::collections::BTreeMap;

use crate::errors::EngineError;
use crate::metrics::Metrics;

const DEFAULT_MATERIAL_RATE: f64 = 50.0;
const DEFAULT_CUTTING_RATE_PER_M: f64 = 0.2;
const DEFAULT_PIERCE_RATE_PER_HOLE: f64 = 0.05;
const DEFAULT_SETUP_FEE: f64 = 5.0;

/// 计价费率表。材料单价按平方米计，切割单价按米计。
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRates {
    pub materials: BTreeMap<String, f64>,
    pub default_material_rate: f64,
    pub cutting_rate_per_m: f64,
    pub pierce_rate_per_hole: f64,
    pub setup_fee: f64,
}

impl Default for PricingRates {
    fn default() -> Self {
        let materials = [("Aluminum", 50.0), ("Steel", 60.0), ("Brass", 70.0)]
            .into_iter()
            .map(|(name, rate)| (name.to_string(), rate))
            .collect();
        Self {
            materials,
            default_material_rate: DEFAULT_MATERIAL_RATE,
            cutting_rate_per_m: DEFAULT_CUTTING_RATE_PER_M,
            pierce_rate_per_hole: DEFAULT_PIERCE_RATE_PER_HOLE,
            setup_fee: DEFAULT_SETUP_FEE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialRate {
    pub rate: f64,
    /// 材料名不在费率表中，使用了默认单价。
    pub is_fallback: bool,
}

impl PricingRates {
    /// 先精确匹配，再忽略 ASCII 大小写匹配，最后回退到默认单价。
    pub fn material_rate(&self, material: &str) -> MaterialRate {
        let found = self.materials.get(material).copied().or_else(|| {
            self.materials
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(material))
                .map(|(_, rate)| *rate)
        });
        match found {
            Some(rate) => MaterialRate {
                rate,
                is_fallback: false,
            },
            None => MaterialRate {
                rate: self.default_material_rate,
                is_fallback: true,
            },
        }
    }
}

/// 作业参数。构造时校验板厚为正、数量至少为 1。
#[derive(Debug, Clone, PartialEq)]
pub struct PricingInput {
    material: String,
    thickness_mm: f64,
    quantity: u32,
}

impl PricingInput {
    pub fn new(
        material: impl Into<String>,
        thickness_mm: f64,
        quantity: u32,
    ) -> Result<Self, EngineError> {
        if !thickness_mm.is_finite() || thickness_mm <= 0.0 {
            return Err(EngineError::InvalidPricingInput(format!(
                "thickness must be a positive number of millimetres, got {thickness_mm}"
            )));
        }
        if quantity == 0 {
            return Err(EngineError::InvalidPricingInput(
                "quantity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            material: material.into(),
            thickness_mm,
            quantity,
        })
    }

    #[inline]
    pub fn material(&self) -> &str {
        &self.material
    }

    #[inline]
    pub fn thickness_mm(&self) -> f64 {
        self.thickness_mm
    }

    #[inline]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// 报价明细，保留全精度；展示层再做舍入。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub material_rate: f64,
    /// 包围盒面积（mm²），材料面积的近似值。
    pub area_mm2: f64,
    pub material_cost: f64,
    pub cutting_cost: f64,
    pub pierce_cost: f64,
    pub setup_fee: f64,
    pub total: f64,
}

/// 纯函数计价：相同输入得到逐位相同的结果。
pub fn price(metrics: &Metrics, input: &PricingInput, rates: &PricingRates) -> Pricing {
    let material_rate = rates.material_rate(input.material()).rate;
    let area_mm2 = metrics.bounding_box.width * metrics.bounding_box.height;
    let material_cost = (area_mm2 / 1e6) * material_rate;
    let cutting_cost = (metrics.cut_length / 1000.0) * rates.cutting_rate_per_m;
    let pierce_cost = metrics.hole_count() as f64 * rates.pierce_rate_per_hole;
    let setup_fee = rates.setup_fee;
    let unit_cost = material_cost + cutting_cost + pierce_cost + setup_fee;
    let total = unit_cost * f64::from(input.quantity());

    Pricing {
        material_rate,
        area_mm2,
        material_cost,
        cutting_cost,
        pierce_cost,
        setup_fee,
        total,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::metrics::BoundingBox;

    fn metrics(width: f64, height: f64, cut_length: f64, holes: usize) -> Metrics {
        Metrics {
            bounding_box: BoundingBox { width, height },
            cut_length,
            hole_diameters: vec![3.0; holes],
            warnings: Vec::new(),
            entities_seen: BTreeSet::new(),
        }
    }

    #[test]
    fn steel_job_matches_reference_breakdown() {
        let metrics = metrics(100.0, 50.0, 300.0, 2);
        let input = PricingInput::new("Steel", 2.0, 10).expect("valid input");
        let pricing = price(&metrics, &input, &PricingRates::default());

        assert!((pricing.material_rate - 60.0).abs() < 1e-12);
        assert!((pricing.area_mm2 - 5_000.0).abs() < 1e-12);
        assert!((pricing.material_cost - 0.3).abs() < 1e-9);
        assert!((pricing.cutting_cost - 0.06).abs() < 1e-9);
        assert!((pricing.pierce_cost - 0.1).abs() < 1e-9);
        assert!((pricing.setup_fee - 5.0).abs() < 1e-12);
        assert!((pricing.total - 54.6).abs() < 1e-9);
    }

    #[test]
    fn total_scales_linearly_with_quantity() {
        let metrics = metrics(240.0, 120.0, 1_234.5, 7);
        let rates = PricingRates::default();
        let one = price(&metrics, &PricingInput::new("Brass", 3.0, 1).unwrap(), &rates);
        for quantity in [2_u32, 5, 10, 250] {
            let many = price(
                &metrics,
                &PricingInput::new("Brass", 3.0, quantity).unwrap(),
                &rates,
            );
            assert!((many.total - one.total * f64::from(quantity)).abs() < 1e-9);
            assert_eq!(many.material_cost, one.material_cost);
        }
    }

    #[test]
    fn pricing_is_deterministic() {
        let metrics = metrics(333.3, 77.7, 987.65, 3);
        let input = PricingInput::new("Aluminum", 1.5, 4).unwrap();
        let rates = PricingRates::default();
        let first = price(&metrics, &input, &rates);
        let second = price(&metrics, &input, &rates);
        assert_eq!(first.total.to_bits(), second.total.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn material_lookup_falls_back_to_default() {
        let rates = PricingRates::default();
        assert_eq!(
            rates.material_rate("Steel"),
            MaterialRate {
                rate: 60.0,
                is_fallback: false
            }
        );
        assert_eq!(rates.material_rate("steel").rate, 60.0);
        let unknown = rates.material_rate("Titanium");
        assert!(unknown.is_fallback);
        assert_eq!(unknown.rate, 50.0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(matches!(
            PricingInput::new("Steel", 0.0, 1),
            Err(EngineError::InvalidPricingInput(_))
        ));
        assert!(matches!(
            PricingInput::new("Steel", f64::NAN, 1),
            Err(EngineError::InvalidPricingInput(_))
        ));
        assert!(matches!(
            PricingInput::new("Steel", 2.0, 0),
            Err(EngineError::InvalidPricingInput(_))
        ));
    }
}
