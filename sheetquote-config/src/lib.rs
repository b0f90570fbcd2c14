use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use sheetquote_engine::{DfmRules, FlattenLimits, PricingRates};
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub dfm: DfmConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `SHEETQUOTE_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

pub const CONFIG_ENV: &str = "SHEETQUOTE_CONFIG";

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 块展开的资源上限，防止恶意或损坏的图纸耗尽内存。缺省值取自引擎。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_block_depth: usize,
    pub max_entities: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = FlattenLimits::default();
        Self {
            max_block_depth: limits.max_depth,
            max_entities: limits.max_entities,
        }
    }
}

/// 可制造性检查阈值，单位毫米。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DfmConfig {
    pub max_sheet_width: f64,
    pub max_sheet_height: f64,
    pub min_hole_factor: f64,
}

impl Default for DfmConfig {
    fn default() -> Self {
        let rules = DfmRules::default();
        Self {
            max_sheet_width: rules.max_sheet_width,
            max_sheet_height: rules.max_sheet_height,
            min_hole_factor: rules.min_hole_factor,
        }
    }
}

/// 费率表。`[pricing.materials]` 中的条目覆盖或补充内置材料，不会清空内置表。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    #[serde(deserialize_with = "merge_with_builtin_materials")]
    pub materials: BTreeMap<String, f64>,
    pub default_material_rate: f64,
    pub cutting_rate_per_m: f64,
    pub pierce_rate_per_hole: f64,
    pub setup_fee: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let rates = PricingRates::default();
        Self {
            materials: rates.materials,
            default_material_rate: rates.default_material_rate,
            cutting_rate_per_m: rates.cutting_rate_per_m,
            pierce_rate_per_hole: rates.pierce_rate_per_hole,
            setup_fee: rates.setup_fee,
        }
    }
}

fn merge_with_builtin_materials<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<String, f64>::deserialize(deserializer)?;
    let mut materials = PricingRates::default().materials;
    materials.extend(overrides);
    Ok(materials)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
