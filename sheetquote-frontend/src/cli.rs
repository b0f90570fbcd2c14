use std::io::Write;
use std::path::PathBuf;

use sheetquote_config::{AppConfig, OutputFormat};
use sheetquote_engine::{PricingInput, QuoteEngine};
use tracing::info;

use crate::errors::FrontendError;
use crate::loader::{load_drawing, quote_settings};
use crate::report::{ErrorReport, QuoteReport};

/// 一次报价请求：图纸路径加作业参数。
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub path: PathBuf,
    pub material: String,
    pub thickness_mm: f64,
    pub quantity: u32,
    pub format: OutputFormat,
}

/// 加载图纸、运行报价流水线，并把结果按请求格式写入 `out`。
pub fn run_quote<W: Write>(
    request: &QuoteRequest,
    config: &AppConfig,
    out: &mut W,
) -> Result<QuoteReport, FrontendError> {
    info!(path = %request.path.display(), material = %request.material, "开始报价");

    let input = PricingInput::new(
        request.material.clone(),
        request.thickness_mm,
        request.quantity,
    )?;
    let drawing = load_drawing(&request.path)?;
    let engine = QuoteEngine::new(quote_settings(config));
    let quote = engine.quote(&drawing, &input)?;

    let report = QuoteReport::new(&quote, &input);
    match request.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            writeln!(out, "报价文件: {}", request.path.display())?;
            writeln!(out, "{}", report.to_text())?;
        }
    }
    Ok(report)
}

/// 把失败信息按请求格式写出。JSON 模式下写入结构化负载。
pub fn write_error<W: Write>(
    err: &FrontendError,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), FrontendError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &ErrorReport::from(err))?;
            writeln!(out)?;
        }
        OutputFormat::Text => writeln!(out, "报价失败: {err}")?,
    }
    Ok(())
}
