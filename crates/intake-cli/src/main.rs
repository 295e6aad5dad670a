//! Intake Guard CLI - inspect the sanitization pipeline from a terminal

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;

use intake_core::{
    InputPipeline, PipelineConfig, RateLimitConfig, SanitizeContext,
};

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Intake Guard - input sanitization and threat classification")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run one input through the pipeline and print the result
    Scan {
        /// The text to sanitize
        text: String,
        /// Rendering sink to harden for (html, sql, plain, general)
        #[arg(short, long, default_value = "general")]
        context: String,
        /// Model identifier selecting the escaping strategy
        #[arg(short, long, default_value = "default")]
        model: String,
        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive demo REPL
    Demo {
        /// Model identifier selecting the escaping strategy
        #[arg(short, long, default_value = "claude")]
        model: String,
        /// Requests admitted per minute
        #[arg(short, long, default_value_t = 30)]
        limit: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    match cli.command {
        Some(Commands::Scan {
            text,
            context,
            model,
            json,
        }) => scan(&text, &context, &model, json),
        Some(Commands::Demo { model, limit }) => demo(&model, limit),
        None => {
            println!("Intake Guard v0.1.0 - Use --help for commands");
            Ok(())
        }
    }
}

fn scan(text: &str, context: &str, model: &str, json: bool) -> anyhow::Result<()> {
    let context: SanitizeContext = context
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --context")?;

    let config = PipelineConfig::default()
        .with_model_type(model)
        .with_sanitize_context(context)
        .with_rate_limit(RateLimitConfig::new(1000, 60.0));
    let mut pipeline = InputPipeline::new(config)?;

    match pipeline.run(text) {
        Ok((sanitized, intent)) => {
            if json {
                let summary = pipeline.security_summary();
                let out = serde_json::json!({
                    "sanitized": sanitized,
                    "intent": intent.intent_type.to_string(),
                    "confidence": intent.confidence,
                    "threat_level": pipeline.last_threat().to_string(),
                    "attack_counts": summary.attack_counts,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("sanitized: {sanitized}");
                println!(
                    "intent:    {} (confidence {:.2})",
                    intent.intent_type, intent.confidence
                );
                println!("threat:    {}", pipeline.last_threat());
                let summary = pipeline.security_summary();
                if summary.total_attacks > 0 {
                    println!("attacks:");
                    for (category, count) in &summary.attack_counts {
                        println!("  {category}: {count}");
                    }
                }
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("rejected ({}): {err}", err.reason_code());
            std::process::exit(1);
        }
    }
}

fn demo(model: &str, limit: u32) -> anyhow::Result<()> {
    let config = PipelineConfig::default()
        .with_model_type(model)
        .with_rate_limit(RateLimitConfig::new(limit, 60.0));
    let mut pipeline = InputPipeline::new(config)?
        .with_feedback(Box::new(|msg| println!("  [!] {msg}")));

    println!("Intake Guard demo - model: {model}, limit: {limit}/min");
    println!("Commands: quit, clear, context, summary, model <id>");
    println!();

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        match input {
            "" => continue,
            "quit" => break,
            "clear" => {
                pipeline.clear_context();
                println!("context cleared");
                continue;
            }
            "context" => {
                let ctx = pipeline.conversation_context();
                if ctx.is_empty() {
                    println!("no context yet");
                } else {
                    println!("context: {ctx}");
                }
                continue;
            }
            "summary" => {
                let summary = pipeline.security_summary();
                println!("total attacks: {}", summary.total_attacks);
                for (category, count) in &summary.attack_counts {
                    println!("  {category}: {count}");
                }
                continue;
            }
            _ => {}
        }

        if let Some(model_id) = input.strip_prefix("model ") {
            pipeline.update_model_type(model_id.trim());
            println!("model set to {}", model_id.trim());
            continue;
        }

        match pipeline.run(input) {
            Ok((sanitized, intent)) => {
                println!("  sanitized: {sanitized}");
                println!(
                    "  intent:    {} (confidence {:.2})",
                    intent.intent_type, intent.confidence
                );
                println!("  threat:    {}", pipeline.last_threat());
            }
            Err(err) => {
                println!("  rejected ({}): {err}", err.reason_code());
            }
        }
    }

    println!("bye");
    Ok(())
}
