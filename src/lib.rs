pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod periods;
pub mod pipeline;

pub use config::Config;
pub use error::{ExportError, FetchError, PipelineError, TransformError};
pub use export::{export_table, read_period_table, DEFAULT_OUTPUT_PATH};
pub use fetch::{PeriodSource, SidraClient};
pub use periods::{build_period_table, PeriodRow, PeriodTable};
