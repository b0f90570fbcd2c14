use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use sheetquote_config::{AppConfig, ConfigError, OutputFormat};
use sheetquote_frontend::{FrontendError, QuoteRequest, run_quote, write_error};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "sheetquote")]
#[command(about = "Instant quotes for sheet-cut parts from DXF drawings")]
#[command(version)]
struct Cli {
    /// DXF drawing to quote
    file: PathBuf,

    /// Material name (e.g., Aluminum, Steel, Brass)
    #[arg(short, long)]
    material: String,

    /// Sheet thickness in millimetres
    #[arg(short, long)]
    thickness: f64,

    /// Number of parts
    #[arg(short, long, default_value = "1")]
    quantity: u32,

    /// Configuration file (overrides SHEETQUOTE_CONFIG and ./config/default.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            init_logging(&AppConfig::default());
            error!(error = %err, "加载配置失败");
            // 配置无法读取时不知道配置里的输出格式，只看命令行
            let format = if cli.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            report_failure(&FrontendError::from(err), format);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);
    info!("启动 sheetquote");

    let format = if cli.json {
        OutputFormat::Json
    } else {
        config.output.format
    };
    let request = QuoteRequest {
        path: cli.file,
        material: cli.material,
        thickness_mm: cli.thickness,
        quantity: cli.quantity,
        format,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run_quote(&request, &config, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "报价失败");
            drop(out);
            report_failure(&err, format);
            ExitCode::FAILURE
        }
    }
}

/// JSON 模式下错误负载写到 stdout，供调用方解析；文本模式写到 stderr。
fn report_failure(err: &FrontendError, format: OutputFormat) {
    let written = match format {
        OutputFormat::Json => write_error(err, format, &mut io::stdout().lock()),
        OutputFormat::Text => write_error(err, format, &mut io::stderr()),
    };
    if let Err(write_err) = written {
        error!(error = %write_err, "无法输出错误信息");
    }
}

/// `--config` 优先，其次是 `SHEETQUOTE_CONFIG` 与 `./config/default.toml`。
/// 指定了却读不出来的配置一律视为错误，不回退到默认值。
fn load_configuration(override_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    // 日志写到 stderr，stdout 只留给报价结果
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
