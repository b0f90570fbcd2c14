pub mod flatten;
pub mod metrics;
pub mod pricing;
pub mod quote;

pub mod errors {
    use thiserror::Error;

    /// 报价流水线中的致命错误。任何一种都会中止流水线，不返回部分结果。
    #[derive(Debug, Error, PartialEq)]
    pub enum EngineError {
        #[error("block reference names unknown block `{0}`")]
        UnknownBlock(String),
        #[error("block expansion exceeded depth limit {limit} while expanding `{block}`")]
        RecursionLimitExceeded { block: String, limit: usize },
        #[error("flattening exceeded entity limit {limit}")]
        ResourceLimitExceeded { limit: usize },
        #[error("no supported entities found (detected: {})", .entities_detected.join(", "))]
        NoGeometryFound { entities_detected: Vec<String> },
        #[error("invalid pricing input: {0}")]
        InvalidPricingInput(String),
    }
}

pub use errors::EngineError;
pub use flatten::{FlattenLimits, flatten};
pub use metrics::{BoundingBox, DfmRules, Metrics, MetricsAccumulator, measure};
pub use pricing::{MaterialRate, Pricing, PricingInput, PricingRates, price};
pub use quote::{Quote, QuoteEngine, QuoteSettings};
