use std::path::Path;

use sheetquote_config::AppConfig;
use sheetquote_core::drawing::Drawing;
use sheetquote_engine::{DfmRules, FlattenLimits, PricingRates, QuoteSettings};
use sheetquote_io::{DrawingLoader, DxfFacade};
use tracing::info;

use crate::errors::FrontendError;

/// 解码 DXF 文件。解码失败统一归为 `FrontendError::Parse`。
pub fn load_drawing(path: &Path) -> Result<Drawing, FrontendError> {
    let loader = DxfFacade::new();
    let drawing = loader.load(path)?;
    info!(
        path = %path.display(),
        entities = drawing.entity_count(),
        blocks = drawing.blocks().count(),
        "从 DXF 加载图纸成功"
    );
    Ok(drawing)
}

/// 把配置文件中的阈值与费率转换为引擎设置。
pub fn quote_settings(config: &AppConfig) -> QuoteSettings {
    QuoteSettings {
        limits: FlattenLimits {
            max_depth: config.limits.max_block_depth,
            max_entities: config.limits.max_entities,
        },
        dfm: DfmRules {
            max_sheet_width: config.dfm.max_sheet_width,
            max_sheet_height: config.dfm.max_sheet_height,
            min_hole_factor: config.dfm.min_hole_factor,
        },
        rates: PricingRates {
            materials: config.pricing.materials.clone(),
            default_material_rate: config.pricing.default_material_rate,
            cutting_rate_per_m: config.pricing.cutting_rate_per_m,
            pierce_rate_per_hole: config.pricing.pierce_rate_per_hole,
            setup_fee: config.pricing.setup_fee,
        },
    }
}
