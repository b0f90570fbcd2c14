use serde::Serialize;
use sheetquote_engine::{EngineError, PricingInput, Quote};

use crate::errors::FrontendError;

/// 对外输出的报价结果。只有这一层做舍入：尺寸保留 2 位小数，金额保留 3 位。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteReport {
    pub metrics: MetricsReport,
    pub pricing: PricingReport,
    pub entities_detected: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    /// `[宽, 高]`，单位毫米。
    pub bounding_box: [f64; 2],
    pub cut_length: f64,
    pub hole_count: usize,
    pub hole_diameters: Vec<f64>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingReport {
    pub material: String,
    pub thickness_mm: f64,
    pub quantity: u32,
    pub material_rate: f64,
    pub material_cost: f64,
    pub cutting_cost: f64,
    pub pierce_cost: f64,
    pub setup_fee: f64,
    pub total: f64,
}

impl QuoteReport {
    pub fn new(quote: &Quote, input: &PricingInput) -> Self {
        let metrics = &quote.metrics;
        let pricing = &quote.pricing;
        Self {
            metrics: MetricsReport {
                bounding_box: [
                    round_to(metrics.bounding_box.width, 2),
                    round_to(metrics.bounding_box.height, 2),
                ],
                cut_length: round_to(metrics.cut_length, 2),
                hole_count: metrics.hole_count(),
                hole_diameters: metrics
                    .hole_diameters
                    .iter()
                    .map(|diameter| round_to(*diameter, 2))
                    .collect(),
                warnings: metrics.warnings.clone(),
            },
            pricing: PricingReport {
                material: input.material().to_string(),
                thickness_mm: input.thickness_mm(),
                quantity: input.quantity(),
                material_rate: pricing.material_rate,
                material_cost: round_to(pricing.material_cost, 3),
                cutting_cost: round_to(pricing.cutting_cost, 3),
                pierce_cost: round_to(pricing.pierce_cost, 3),
                setup_fee: round_to(pricing.setup_fee, 3),
                total: round_to(pricing.total, 3),
            },
            entities_detected: quote.entities_detected.iter().cloned().collect(),
            warnings: quote.warnings.clone(),
        }
    }

    /// 人类可读的多行摘要。
    pub fn to_text(&self) -> String {
        let metrics = &self.metrics;
        let pricing = &self.pricing;
        let mut lines = vec![
            format!(
                "包围盒: {:.2} x {:.2} mm",
                metrics.bounding_box[0], metrics.bounding_box[1]
            ),
            format!("切割长度: {:.2} mm", metrics.cut_length),
        ];
        if metrics.hole_diameters.is_empty() {
            lines.push("孔: 0".to_string());
        } else {
            let diameters: Vec<String> = metrics
                .hole_diameters
                .iter()
                .map(|d| format!("{d:.2}"))
                .collect();
            lines.push(format!(
                "孔: {} (直径 mm: {})",
                metrics.hole_count,
                diameters.join(", ")
            ));
        }
        lines.push(format!(
            "材料: {} {} mm × {} 件 (单价 {}/m²)",
            pricing.material, pricing.thickness_mm, pricing.quantity, pricing.material_rate
        ));
        lines.push(format!("  材料费: {:.3}", pricing.material_cost));
        lines.push(format!("  切割费: {:.3}", pricing.cutting_cost));
        lines.push(format!("  穿孔费: {:.3}", pricing.pierce_cost));
        lines.push(format!("  开机费: {:.3}", pricing.setup_fee));
        lines.push(format!("总价: {:.3}", pricing.total));
        lines.push(format!("识别实体: {}", self.entities_detected.join(", ")));
        for warning in &self.warnings {
            lines.push(format!("警告: {warning}"));
        }
        lines.join("\n")
    }
}

/// 失败时的 JSON 负载。几何缺失时附带检测到的实体类型，便于用户排查。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities_detected: Option<Vec<String>>,
}

impl From<&FrontendError> for ErrorReport {
    fn from(err: &FrontendError) -> Self {
        match err {
            FrontendError::Engine(EngineError::NoGeometryFound { entities_detected }) => Self {
                error: "No supported entities found".to_string(),
                entities_detected: Some(entities_detected.clone()),
            },
            other => Self {
                error: other.to_string(),
                entities_detected: None,
            },
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io;
    use std::path::PathBuf;

    use serde_json::json;
    use sheetquote_config::ConfigError;
    use sheetquote_engine::{BoundingBox, Metrics, Pricing};

    use super::*;

    fn sample_quote() -> (Quote, PricingInput) {
        let metrics = Metrics {
            bounding_box: BoundingBox {
                width: 100.004,
                height: 49.996,
            },
            cut_length: 325.132_741,
            hole_diameters: vec![3.999_9, 4.0],
            warnings: Vec::new(),
            entities_seen: ["POLYLINE", "CIRCLE"].into_iter().map(String::from).collect(),
        };
        let pricing = Pricing {
            material_rate: 60.0,
            area_mm2: 5_000.0,
            material_cost: 0.300_02,
            cutting_cost: 0.065_026_5,
            pierce_cost: 0.1,
            setup_fee: 5.0,
            total: 54.650_465,
        };
        let quote = Quote {
            entities_detected: metrics.entities_seen.clone(),
            metrics,
            pricing,
            warnings: vec!["unknown material 'X', using default rate 50/m²".to_string()],
        };
        let input = PricingInput::new("Steel", 2.0, 10).expect("valid input");
        (quote, input)
    }

    #[test]
    fn report_rounds_at_the_boundary() {
        let (quote, input) = sample_quote();
        let report = QuoteReport::new(&quote, &input);

        assert_eq!(report.metrics.bounding_box, [100.0, 50.0]);
        assert_eq!(report.metrics.cut_length, 325.13);
        assert_eq!(report.metrics.hole_diameters, vec![4.0, 4.0]);
        assert_eq!(report.metrics.hole_count, 2);
        assert_eq!(report.pricing.material_cost, 0.3);
        assert_eq!(report.pricing.cutting_cost, 0.065);
        assert_eq!(report.pricing.total, 54.65);
        // 引擎侧的值保持全精度
        assert_eq!(quote.metrics.cut_length, 325.132_741);
    }

    #[test]
    fn report_serializes_with_reference_shape() {
        let (quote, input) = sample_quote();
        let value = serde_json::to_value(QuoteReport::new(&quote, &input)).expect("serialize");

        assert_eq!(value["metrics"]["bounding_box"], json!([100.0, 50.0]));
        assert_eq!(value["metrics"]["hole_count"], json!(2));
        assert_eq!(value["pricing"]["material"], json!("Steel"));
        assert_eq!(value["pricing"]["quantity"], json!(10));
        assert_eq!(value["entities_detected"], json!(["CIRCLE", "POLYLINE"]));
        assert_eq!(value["warnings"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn text_summary_lists_costs_and_warnings() {
        let (quote, input) = sample_quote();
        let text = QuoteReport::new(&quote, &input).to_text();
        assert!(text.contains("切割长度: 325.13 mm"));
        assert!(text.contains("总价: 54.650"));
        assert!(text.contains("警告: unknown material 'X'"));
    }

    #[test]
    fn missing_geometry_error_carries_detected_entities() {
        let err = FrontendError::Engine(EngineError::NoGeometryFound {
            entities_detected: vec!["TEXT".to_string()],
        });
        let payload = serde_json::to_value(ErrorReport::from(&err)).expect("serialize");
        assert_eq!(
            payload,
            json!({ "error": "No supported entities found", "entities_detected": ["TEXT"] })
        );

        let other = FrontendError::Engine(EngineError::UnknownBlock("BOLT".to_string()));
        let payload = serde_json::to_value(ErrorReport::from(&other)).expect("serialize");
        assert_eq!(
            payload,
            json!({ "error": "block reference names unknown block `BOLT`" })
        );
    }

    #[test]
    fn config_error_payload_names_the_file() {
        let err = FrontendError::Config(ConfigError::Io {
            path: PathBuf::from("quote.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        });
        let payload = serde_json::to_value(ErrorReport::from(&err)).expect("serialize");
        let message = payload["error"].as_str().expect("error string");
        assert!(message.starts_with("failed to load configuration"));
        assert!(message.contains("quote.toml"));
        assert!(payload.get("entities_detected").is_none());
    }

    #[test]
    fn empty_entity_set_serializes_as_empty_list() {
        let (mut quote, input) = sample_quote();
        quote.entities_detected = BTreeSet::new();
        let value = serde_json::to_value(QuoteReport::new(&quote, &input)).expect("serialize");
        assert_eq!(value["entities_detected"], json!([]));
    }
}
