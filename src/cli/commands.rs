//! Command implementations for the Tiffin CLI.

use std::io::{self, BufRead, Write};

use log::{debug, info};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::EngineConfig;
use crate::corpus;
use crate::dispatch::DispatchOutcome;
use crate::engine::Engine;
use crate::error::Result;

/// Words that end an interactive session, besides an empty line.
const EXIT_COMMAND: &str = "exit";

/// Execute a CLI command.
pub fn execute_command(args: TiffinArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    match &args.command {
        Command::Train(train_args) => train(train_args.clone(), config, &args),
        Command::Chat(chat_args) => chat(chat_args.clone(), config, &args),
        Command::Predict(predict_args) => predict(predict_args.clone(), config, &args),
        Command::Extract(text_args) => extract(text_args.clone(), config, &args),
        Command::Correct(text_args) => correct(text_args.clone(), config, &args),
    }
}

/// Merge the config file (if any) with command line overrides.
pub fn resolve_config(args: &TiffinArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            EngineConfig::load(path)?
        }
        None => EngineConfig::default(),
    };

    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(threshold) = args.threshold {
        config.confidence_threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

/// Retrain the intent model and rebuild the entity spotters.
fn train(args: TrainArgs, mut config: EngineConfig, cli_args: &TiffinArgs) -> Result<()> {
    config.force_retrain = true;
    let engine = Engine::builder(config).build()?;

    let model = engine.classifier().current();
    let corpus_metrics = if args.evaluate {
        let examples = corpus::training_examples(engine.intents());
        Some(engine.classifier().evaluate(&examples)?)
    } else {
        None
    };

    let report = TrainingReport {
        examples: model.as_ref().map_or(0, |m| m.training_examples()),
        labels: engine.classifier().labels(),
        features: model.as_ref().map_or(0, |m| m.vocabulary_size()),
        iterations: model.as_ref().map_or(0, |m| m.stats().iterations),
        final_loss: model.as_ref().map_or(0.0, |m| m.stats().final_loss),
        converged: model.as_ref().is_some_and(|m| m.stats().converged),
        training_time_ms: model.as_ref().map_or(0, |m| m.stats().training_time_ms),
        validation: engine.last_metrics(),
        corpus: corpus_metrics,
        model_path: engine
            .config()
            .intent_model_path()
            .to_string_lossy()
            .to_string(),
    };

    output_result("Training completed", &report, cli_args)
}

/// Interactive session over stdin.
fn chat(args: ChatArgs, mut config: EngineConfig, cli_args: &TiffinArgs) -> Result<()> {
    config.force_retrain = args.retrain;
    let engine = Engine::builder(config).build()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let turns = run_chat(
        &engine,
        stdin.lock(),
        &mut stdout.lock(),
        &args,
        cli_args.output_format,
    )?;
    info!("Chat session ended after {turns} turns");
    Ok(())
}

/// Run the read-respond loop until an empty line, `exit`, or end of input.
///
/// Errors that only affect one utterance are reported and the loop
/// continues; fatal errors end the session. Returns the number of
/// utterances answered.
pub fn run_chat<R: BufRead, W: Write>(
    engine: &Engine,
    input: R,
    output: &mut W,
    args: &ChatArgs,
    format: OutputFormat,
) -> Result<usize> {
    let interactive = format == OutputFormat::Human;
    let mut turns = 0;

    if interactive {
        write!(output, "> ")?;
        output.flush()?;
    }
    for line in input.lines() {
        let line = line?;
        let utterance = line.trim();
        if utterance.is_empty() || utterance.eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }

        let outcome = match engine.respond(utterance) {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                writeln!(output, "Error: {e}")?;
                continue;
            }
        };
        turns += 1;

        match format {
            OutputFormat::Human => {
                writeln!(output, "{}", outcome.text())?;
                if args.explain
                    && let Some(response) = outcome.response()
                {
                    writeln!(
                        output,
                        "  [{} {:.3}]",
                        response.predicted_label, response.confidence
                    )?;
                }
                write!(output, "> ")?;
                output.flush()?;
            }
            OutputFormat::Json => {
                writeln!(output, "{}", to_json(&chat_turn(utterance, &outcome), false)?)?;
            }
        }
    }
    if interactive {
        writeln!(output)?;
    }
    Ok(turns)
}

fn chat_turn(utterance: &str, outcome: &DispatchOutcome) -> ChatTurn {
    let response = outcome.response();
    ChatTurn {
        question: utterance.to_string(),
        reply: outcome.text().to_string(),
        understood: response.is_some(),
        label: response.map(|r| r.predicted_label.clone()),
        confidence: response.map(|r| r.confidence),
        entities: response.map(|r| r.entities.clone()).unwrap_or_default(),
    }
}

/// Classify one utterance.
fn predict(args: PredictArgs, config: EngineConfig, cli_args: &TiffinArgs) -> Result<()> {
    let engine = Engine::builder(config).build()?;
    let prediction = engine.predict(&args.text)?;

    let result = PredictionResult {
        accepted: engine.router().accepts(prediction.confidence),
        scores: prediction.top(args.top),
        text: args.text,
        label: prediction.label,
        confidence: prediction.confidence,
    };
    output_result("Prediction", &result, cli_args)
}

/// Extract entities from one utterance.
fn extract(args: TextArgs, config: EngineConfig, cli_args: &TiffinArgs) -> Result<()> {
    let engine = Engine::builder(config).build()?;
    let entities = engine.extract(&args.text)?;
    output_result(
        "Entities",
        &ExtractionResult {
            text: args.text,
            entities,
        },
        cli_args,
    )
}

/// Spell-correct one utterance.
fn correct(args: TextArgs, config: EngineConfig, cli_args: &TiffinArgs) -> Result<()> {
    let corrector = crate::spelling::SpellingCorrector::from_files(
        &config.dictionary_path(),
        &config.affix_path(),
        config.domain_words_path().as_deref(),
        config.corrector.clone(),
    )?;
    output_result(
        "Spelling correction",
        &corrector.correct_with_report(&args.text),
        cli_args,
    )
}
