//! Interactive question loop.
//!
//! Reads one line at a time. Reserved words are commands; anything else is
//! a question that goes through retrieval and the answering facade. The loop
//! is generic over its input and output so it can be driven from tests.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use crate::enrich;
use crate::error::ValidationError;
use crate::models::{Entity, HeelStrike, Kind};
use crate::pipeline::Pipeline;
use crate::stats;
use crate::store::EntityStore;

pub const HELP: &str = "\
Available commands:
  - Just type a question to query the system
  - 'runners': List all runners and animals
  - 'add': Add a new runner or animal
  - 'save': Save current data to JSON files
  - 'load': Load data from JSON files
  - 'stats': Show average metrics for humans vs animals
  - 'add_stride': Add the stride length metric
  - 'add_efficiency': Add the efficiency score metric
  - 'context <question>': Show the retrieved context without asking the LLM
  - 'help': Show this help message
  - 'quit': Exit the program";

const EXAMPLES: &str = "\
Example questions:
  - Which animal has a running gait most similar to Usain Bolt?
  - Compare human and animal vertical oscillation
  - Which runner has the highest cadence?";

const CONTEXT_PREFIX: &str = "context ";

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Quit,
    Help,
    Runners,
    Add,
    Save,
    Load,
    Stats,
    AddStride,
    AddEfficiency,
    Context(String),
    Ask(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "" => Command::Empty,
            "quit" | "exit" => Command::Quit,
            "help" => Command::Help,
            "runners" => Command::Runners,
            "add" => Command::Add,
            "save" => Command::Save,
            "load" => Command::Load,
            "stats" => Command::Stats,
            "add_stride" => Command::AddStride,
            "add_efficiency" => Command::AddEfficiency,
            _ => match trimmed.get(..CONTEXT_PREFIX.len()) {
                Some(prefix) if prefix.eq_ignore_ascii_case(CONTEXT_PREFIX) => {
                    Command::Context(trimmed[CONTEXT_PREFIX.len()..].trim().to_string())
                }
                _ => Command::Ask(trimmed.to_string()),
            },
        }
    }
}

/// Settings for the interactive loop.
#[derive(Debug, Clone)]
pub struct ReplOptions {
    pub data_dir: PathBuf,
    pub show_context: bool,
}

/// Run the loop until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(
    pipeline: &mut Pipeline,
    options: &ReplOptions,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    print_banner(pipeline, output)?;

    loop {
        write!(output, "\nYour question or command: ")?;
        output.flush()?;

        let line = match read_line(input)? {
            Some(line) => line,
            None => {
                writeln!(output)?;
                break;
            }
        };

        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => {
                writeln!(output, "Thank you for using the Gait Analysis RAG System!")?;
                break;
            }
            Command::Help => {
                writeln!(output)?;
                print_help(pipeline, output)?;
            }
            Command::Runners => write!(output, "\n{}", format_runners(pipeline.entities()))?,
            Command::Stats => write!(output, "\n{}", stats::format_stats(pipeline.entities()))?,
            Command::Save => match pipeline.save(&options.data_dir) {
                Ok(()) => writeln!(
                    output,
                    "Data saved to JSON files in {}",
                    options.data_dir.display()
                )?,
                Err(e) => writeln!(output, "Error: {}", e)?,
            },
            Command::Load => match pipeline.load(&options.data_dir) {
                Ok(()) => writeln!(output, "Data loaded from JSON files")?,
                Err(e) => {
                    writeln!(output, "Warning: {}", e)?;
                    writeln!(output, "JSON files not found or invalid. Using default data.")?;
                }
            },
            Command::Add => add_entity(pipeline, input, output)?,
            Command::AddStride => enable(pipeline, enrich::stride::NAME, output)?,
            Command::AddEfficiency => enable(pipeline, enrich::efficiency::NAME, output)?,
            Command::Context(query) => write!(output, "\n{}", pipeline.retrieve(&query))?,
            Command::Ask(query) => ask(pipeline, options, &query, output)?,
        }
    }

    Ok(())
}

fn print_banner<W: Write>(pipeline: &Pipeline, output: &mut W) -> Result<()> {
    writeln!(output, "{}", "=".repeat(60))?;
    writeln!(output, "Runner & Animal Gait Analysis RAG System")?;
    writeln!(output, "{}", "=".repeat(60))?;
    writeln!(
        output,
        "\nThis system compares gait metrics of famous runners and animals."
    )?;
    writeln!(output, "Completion provider: {}", pipeline.provider_name())?;
    writeln!(output)?;
    print_help(pipeline, output)?;
    writeln!(output, "\n{}", EXAMPLES)?;
    Ok(())
}

/// Command list followed by the metric extensions and whether each is on.
fn print_help<W: Write>(pipeline: &Pipeline, output: &mut W) -> Result<()> {
    writeln!(output, "{}", HELP)?;
    writeln!(output, "\nMetric extensions:")?;
    for name in enrich::BUILTIN {
        let Some(enricher) = enrich::builtin(name) else {
            continue;
        };
        let state = if pipeline.enrichers().find(name).is_some() {
            "enabled"
        } else {
            "off"
        };
        writeln!(
            output,
            "  - {} ({}): {}",
            enricher.name(),
            state,
            enricher.description()
        )?;
    }
    Ok(())
}

/// Retrieve, optionally show the context, answer, and report timing.
pub fn ask<W: Write>(
    pipeline: &Pipeline,
    options: &ReplOptions,
    query: &str,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "\nRetrieving information and generating response...")?;
    let context = pipeline.retrieve(query);

    if options.show_context {
        writeln!(output, "\nRetrieved Context:")?;
        writeln!(output, "{}", "-".repeat(40))?;
        writeln!(output, "{}", context.trim_end())?;
        writeln!(output, "{}", "-".repeat(40))?;
    }
    output.flush()?;

    let start = Utc::now();
    let answer = pipeline.answer_with_context(query, &context);
    let elapsed = (Utc::now() - start).num_milliseconds() as f64 / 1000.0;

    writeln!(output, "\nAnswer (generated in {:.2}s):", elapsed)?;
    writeln!(output, "{}", "=".repeat(60))?;
    writeln!(output, "{}", answer)?;
    writeln!(output, "{}", "=".repeat(60))?;
    Ok(())
}

fn enable<W: Write>(pipeline: &mut Pipeline, name: &str, output: &mut W) -> Result<()> {
    let Some(enricher) = enrich::builtin(name) else {
        writeln!(output, "Unknown metric extension: {}", name)?;
        return Ok(());
    };
    match pipeline.enable(enricher)? {
        true => writeln!(output, "Added {} metric to all runners and animals", name)?,
        false => writeln!(output, "{} is already enabled", name)?,
    }
    Ok(())
}

/// List humans then animals with their descriptions.
pub fn format_runners(entities: &EntityStore) -> String {
    let mut out = String::from("Human Runners:\n");
    for (name, entity) in entities.of_kind(Kind::Human) {
        out.push_str(&format!("  - {} ({})\n", name, entity.description));
    }
    out.push_str("\nAnimals:\n");
    for (name, entity) in entities.of_kind(Kind::Animal) {
        out.push_str(&format!("  - {} ({})\n", name, entity.description));
    }
    out
}

fn add_entity<R: BufRead, W: Write>(
    pipeline: &mut Pipeline,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "\nAdd New Runner or Animal")?;
    writeln!(output, "{}", "-".repeat(40))?;

    let outcome = prompt_new_entity(pipeline.entities(), input, output)?
        .and_then(|(name, entity)| pipeline.add_entity(name.clone(), entity).map(|_| name));

    match outcome {
        Ok(name) => writeln!(output, "{} added to the database.", name)?,
        Err(e) => {
            warn!(error = %e, "entity rejected");
            writeln!(output, "Invalid input: {}. Entity not added.", e)?;
        }
    }
    Ok(())
}

/// Prompt for every field of a new entity.
///
/// Kind and heel strike are asked again until valid. An empty or duplicate
/// name, or a bad number, rejects the whole entity. The outer `Result`
/// carries I/O errors; the inner one carries validation failures.
pub fn prompt_new_entity<R: BufRead, W: Write>(
    existing: &EntityStore,
    input: &mut R,
    output: &mut W,
) -> Result<std::result::Result<(String, Entity), ValidationError>> {
    macro_rules! ask_line {
        ($prompt:expr) => {{
            write!(output, "{}", $prompt)?;
            output.flush()?;
            match read_line(input)? {
                Some(line) => line.trim().to_string(),
                None => return Ok(Err(ValidationError::Incomplete)),
            }
        }};
    }

    let name = ask_line!("Name: ");
    if name.is_empty() {
        return Ok(Err(ValidationError::EmptyName));
    }
    if existing.contains(&name) {
        return Ok(Err(ValidationError::DuplicateName(name)));
    }

    let kind = loop {
        match ask_line!("Type (human/animal): ").parse::<Kind>() {
            Ok(kind) => break kind,
            Err(_) => writeln!(output, "Please enter either 'human' or 'animal'.")?,
        }
    };

    let description = ask_line!("Description: ");

    let cadence = match parse_cadence(&ask_line!("Cadence (steps/minute): ")) {
        Ok(c) => c,
        Err(e) => return Ok(Err(e)),
    };

    let heel_strike = loop {
        match ask_line!("Heel strike (low/medium/high/none): ").parse::<HeelStrike>() {
            Ok(hs) => break hs,
            Err(_) => writeln!(output, "Please enter one of: low, medium, high, none.")?,
        }
    };

    let vertical_oscillation =
        match parse_vertical_oscillation(&ask_line!("Vertical oscillation (cm): ")) {
            Ok(v) => v,
            Err(e) => return Ok(Err(e)),
        };

    Ok(Ok((
        name,
        Entity::new(kind, cadence, heel_strike, vertical_oscillation, description),
    )))
}

pub fn parse_cadence(raw: &str) -> std::result::Result<u32, ValidationError> {
    match raw.trim().parse::<u32>() {
        Ok(c) if c > 0 => Ok(c),
        _ => Err(ValidationError::InvalidNumber {
            field: "cadence",
            value: raw.trim().to_string(),
        }),
    }
}

pub fn parse_vertical_oscillation(raw: &str) -> std::result::Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ValidationError::InvalidNumber {
            field: "vertical oscillation",
            value: raw.trim().to_string(),
        }),
    }
}

/// One line without its terminator, or `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
