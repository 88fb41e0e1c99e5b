//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::app::{MenuAction, Settings};
use crate::data::DEFAULT_DATA_PATH;
use crate::model::ModelConfig;

/// Customer churn analysis: dataset views, charts and churn prediction
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, env = "CHURNSCOPE_INPUT", default_value = DEFAULT_DATA_PATH)]
    pub input: String,

    /// Directory for generated chart PNGs
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Seed of the train/test split
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Share of rows held out for evaluation
    #[arg(long, default_value = "0.2")]
    pub test_size: f64,

    /// Maximum iterations of the logistic regression solver
    #[arg(long, default_value = "500")]
    pub max_iters: u64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show overview cards, descriptive statistics and column info
    Data,
    /// Bar and pie charts of churned vs retained customers
    Chart,
    /// Histogram of a numeric column
    Eda {
        /// Column to plot (defaults to the first numeric column)
        #[arg(short, long)]
        column: Option<String>,
    },
    /// Fit on 80% of the rows and evaluate on the held-out 20%
    Model,
    /// Predict churn for one customer
    ///
    /// Without --values, lists the expected features and their observed ranges.
    Predict {
        /// Comma-separated feature values in feature column order
        /// Example: --values "12,70.35,0"
        #[arg(long)]
        values: Option<String>,
    },
    /// Static business insights
    Insights,
    /// Interactive session reading one menu command per line
    Shell,
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings {
            output_dir: self.output_dir.clone(),
            model: ModelConfig {
                test_ratio: self.test_size,
                seed: self.seed,
                max_iterations: self.max_iters,
            },
        }
    }

    /// Menu action for a one-shot command; `None` for the shell
    pub fn action(&self) -> crate::Result<Option<MenuAction>> {
        let action = match &self.command {
            Command::Data => MenuAction::ShowData,
            Command::Chart => MenuAction::ChurnChart,
            Command::Eda { column } => MenuAction::Eda {
                column: column.clone(),
            },
            Command::Model => MenuAction::Modeling,
            Command::Predict { values } => MenuAction::Prediction {
                values: values.as_deref().map(parse_feature_values).transpose()?,
            },
            Command::Insights => MenuAction::Insights,
            Command::Shell => return Ok(None),
        };
        Ok(Some(action))
    }
}

/// Parse comma-separated feature values
pub fn parse_feature_values(input: &str) -> crate::Result<Vec<f64>> {
    input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("Invalid feature value: {}", part))
        })
        .collect()
}

/// Parse one shell line into a menu action
///
/// Commands: `load <path>`, `data`, `chart`, `eda [column]`, `model`,
/// `predict [v1,v2,...]`, `insights`.
pub fn parse_shell_command(line: &str) -> crate::Result<MenuAction> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    let action = match command.to_ascii_lowercase().as_str() {
        "load" | "upload" => match arg {
            Some(path) => MenuAction::Load(path),
            None => anyhow::bail!("Usage: load <path>"),
        },
        "data" | "show" => MenuAction::ShowData,
        "chart" => MenuAction::ChurnChart,
        "eda" => MenuAction::Eda { column: arg },
        "model" | "modeling" => MenuAction::Modeling,
        "predict" | "prediction" => MenuAction::Prediction {
            values: arg.as_deref().map(parse_feature_values).transpose()?,
        },
        "insights" => MenuAction::Insights,
        other => anyhow::bail!("Unknown command: {}", other),
    };
    Ok(action)
}
