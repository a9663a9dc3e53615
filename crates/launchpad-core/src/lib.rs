//! Shared data model, channel catalog, baseline template and configuration
//! for the launchpad workflow studio.

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod template;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, BackendSettings, Environment};
pub use catalog::{channel_info, ChannelInfo, CATALOG};
pub use config::{load_app_config, load_app_config_from_env};
pub use template::{baseline_template, TemplateSource};
pub use types::{
    AutopostReceipt, Channel, ChannelBreakdown, ConfigValue, ContentFormat, DispatchStatus,
    SimulationOutput, StepCategory, TargetChannels, ViralAngle, WorkflowStep, WorkflowTemplate,
    DISPLAY_CONFIDENCE_DEFAULT, SIMULATION_CONFIDENCE_DEFAULT,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read template file {path}: {source}")]
    TemplateFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template file: {0}")]
    TemplateFileParse(#[from] serde_yaml::Error),

    #[error("template validation failed: {0}")]
    Validation(String),
}
