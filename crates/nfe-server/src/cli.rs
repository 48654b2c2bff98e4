//! CLI argument definitions for the classification server.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use nfe_infer::DecisionRule;
use nfe_server::ConfigOverrides;

#[derive(Parser)]
#[command(
    name = "nfe-server",
    version,
    about = "Invoice tax classification server",
    long_about = "Look up invoices by SEQ_NFE, edit their features and classify them \
                  into tax categories with a LightGBM model."
)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on (default: 127.0.0.1:8000).
    #[arg(long = "bind", value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Invoice dataset, `;`-delimited with a header row.
    #[arg(long = "data", value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Model artifact in LightGBM text format.
    #[arg(long = "model", value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// How class probabilities become a class.
    #[arg(long = "decision-rule", value_enum)]
    pub decision_rule: Option<DecisionRuleArg>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for humans, json for log shippers).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_addr: self.bind,
            data_path: self.data.clone(),
            model_path: self.model.clone(),
            decision_rule: self.decision_rule.map(DecisionRule::from),
        }
    }
}

/// CLI decision rule choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum DecisionRuleArg {
    /// Argmax over the class axis; single-output models fail.
    ArgmaxOnly,
    /// 0.5 threshold for single-output models, argmax otherwise.
    BinaryThreshold,
}

impl From<DecisionRuleArg> for DecisionRule {
    fn from(arg: DecisionRuleArg) -> Self {
        match arg {
            DecisionRuleArg::ArgmaxOnly => DecisionRule::ArgmaxOnly,
            DecisionRuleArg::BinaryThreshold => DecisionRule::BinaryThreshold,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
