//! Command line argument parsing for the Tiffin CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Tiffin - intent routing for restaurant ordering
#[derive(Parser, Debug, Clone)]
#[command(name = "tiffin")]
#[command(about = "Spelling correction, intent classification and entity spotting for restaurant orders")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TiffinArgs {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// JSON engine configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", env = "TIFFIN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding corpora, dictionaries and model artifacts
    #[arg(short, long, value_name = "DATA_DIR", env = "TIFFIN_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Confidence at or below which utterances are not dispatched
    #[arg(short, long, global = true)]
    pub threshold: Option<f64>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TiffinArgs {
    /// Effective verbosity: 0 quiet, 1 normal, 2 verbose, 3+ debug.
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Retrain the intent model and rebuild the entity spotters
    Train(TrainArgs),

    /// Interactive session; an empty line or "exit" ends it
    Chat(ChatArgs),

    /// Classify one utterance
    Predict(PredictArgs),

    /// Extract entities from one utterance
    Extract(TextArgs),

    /// Spell-correct one utterance
    Correct(TextArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Also score the trained model on the full training corpus
    #[arg(long)]
    pub evaluate: bool,
}

/// Arguments for the interactive session
#[derive(Parser, Debug, Clone)]
pub struct ChatArgs {
    /// Print the predicted label and confidence with each reply
    #[arg(long)]
    pub explain: bool,

    /// Retrain instead of restoring a persisted model
    #[arg(long)]
    pub retrain: bool,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Utterance to classify
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Number of ranked labels to show
    #[arg(short = 'k', long, default_value = "3")]
    pub top: usize,
}

/// Arguments for commands that take a single utterance
#[derive(Parser, Debug, Clone)]
pub struct TextArgs {
    /// Utterance to process
    #[arg(value_name = "TEXT")]
    pub text: String,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_predict_command() {
        let args = TiffinArgs::try_parse_from([
            "tiffin",
            "predict",
            "one masala dosa please",
            "--top",
            "5",
        ])
        .unwrap();

        if let Command::Predict(predict_args) = args.command {
            assert_eq!(predict_args.text, "one masala dosa please");
            assert_eq!(predict_args.top, 5);
        } else {
            panic!("Expected Predict command");
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = TiffinArgs::try_parse_from([
            "tiffin",
            "chat",
            "--data-dir",
            "/srv/tiffin",
            "--threshold",
            "0.6",
            "--explain",
        ])
        .unwrap();

        assert_eq!(args.data_dir, Some(PathBuf::from("/srv/tiffin")));
        assert_eq!(args.threshold, Some(0.6));
        if let Command::Chat(chat_args) = args.command {
            assert!(chat_args.explain);
            assert!(!chat_args.retrain);
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = TiffinArgs::try_parse_from(["tiffin", "train"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = TiffinArgs::try_parse_from(["tiffin", "-v", "train"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = TiffinArgs::try_parse_from(["tiffin", "-vv", "train"]).unwrap();
        assert_eq!(args.verbosity(), 3);

        let args = TiffinArgs::try_parse_from(["tiffin", "--quiet", "-vv", "train"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            TiffinArgs::try_parse_from(["tiffin", "--format", "json", "correct", "dosaa"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(matches!(args.command, Command::Correct(_)));
    }
}
