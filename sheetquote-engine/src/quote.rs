use std::collections::BTreeSet;

use sheetquote_core::drawing::Drawing;
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::flatten::{FlattenLimits, flatten};
use crate::metrics::{DfmRules, Metrics, measure};
use crate::pricing::{Pricing, PricingInput, PricingRates, price};

/// 一次性构造、随后按值传入的引擎配置，不读取任何全局状态。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSettings {
    pub limits: FlattenLimits,
    pub dfm: DfmRules,
    pub rates: PricingRates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub metrics: Metrics,
    pub pricing: Pricing,
    pub entities_detected: BTreeSet<String>,
    /// 可制造性警告在前，随后是未知材料提示；均不阻断报价。
    pub warnings: Vec<String>,
}

/// 展开 → 度量 → 计价 的同步流水线。实例不可变，可在多个请求间共享。
#[derive(Debug, Clone, Default)]
pub struct QuoteEngine {
    settings: QuoteSettings,
}

impl QuoteEngine {
    pub fn new(settings: QuoteSettings) -> Self {
        Self { settings }
    }

    pub fn quote(&self, drawing: &Drawing, input: &PricingInput) -> Result<Quote, EngineError> {
        let flat = flatten(drawing, &self.settings.limits)?;
        debug!(
            layout_entities = drawing.entity_count(),
            flattened = flat.len(),
            "图纸已展开"
        );

        let metrics = measure(&flat, &self.settings.dfm, input.thickness_mm())?;
        let pricing = price(&metrics, input, &self.settings.rates);

        let mut warnings = metrics.warnings.clone();
        let material = self.settings.rates.material_rate(input.material());
        if material.is_fallback {
            warnings.push(format!(
                "unknown material '{}', using default rate {}/m²",
                input.material(),
                material.rate
            ));
        }
        for message in &warnings {
            warn!(warning = %message, "报价警告");
        }

        info!(
            material = input.material(),
            quantity = input.quantity(),
            cut_length = metrics.cut_length,
            holes = metrics.hole_count(),
            total = pricing.total,
            "报价完成"
        );

        Ok(Quote {
            entities_detected: metrics.entities_seen.clone(),
            metrics,
            pricing,
            warnings,
        })
    }
}
