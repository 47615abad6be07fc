pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod gather;
pub mod logs;
pub mod paths;
pub mod tree;

pub use config::{Config, GeneralConfig, LogAggregatorSection, SectionConfig};
pub use content::{ContentBlock, IncludedFile, LINE_LIMIT, generate_content};
pub use context::{ProjectContext, TreeSummary, generate_context, write_context};
pub use error::{AppError, Result};
pub use gather::{SelectionRule, select_files};
pub use logs::{LogAggregator, LogAggregatorConfig, LogLevel};
pub use paths::determine_project_root;
pub use tree::{TreeSpec, generate_tree};
