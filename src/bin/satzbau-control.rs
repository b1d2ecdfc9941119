//! satzbau-control - CLI client for a running satzbau server
//!
//! Talks to the JSON API over HTTP and prints the results.

use clap::{Parser, Subcommand};
use reqwest::blocking::Client;
use serde_json::{json, Value};

/// CLI client for the satzbau sentence server
#[derive(Parser)]
#[command(name = "satzbau-control")]
#[command(author = "StarTuz")]
#[command(version)]
#[command(about = "Control utility for the satzbau sentence server", long_about = None)]
struct Cli {
    /// Base URL of the API, including its prefix
    #[arg(long, default_value = "http://127.0.0.1:5000/api")]
    url: String,

    /// Print raw JSON responses
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List proficiency levels
    Levels,

    /// List topics
    Topics,

    /// Generate and analyse a sentence
    Generate {
        /// Level code (A1..C2)
        #[arg(short, long, default_value = "A1")]
        level: String,
        /// Topic name, see `topics`
        #[arg(short, long, default_value = "Daily Routine")]
        topic: String,
    },

    /// Resolve the audio file for a text
    Audio {
        /// German text
        text: String,
    },

    /// Build an Anki card for a sentence
    Export {
        /// German sentence (card front)
        sentence: String,
        /// English translation
        #[arg(short, long, default_value = "")]
        translation: String,
    },
}

fn call(
    client: &Client,
    base: &str,
    path: &str,
    body: Option<Value>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let url = format!("{}{}", base.trim_end_matches('/'), path);
    let resp = match body {
        Some(b) => client.post(&url).json(&b).send()?,
        None => client.get(&url).send()?,
    };
    let value: Value = resp.json()?;
    if value["success"].as_bool() != Some(true) {
        let msg = value["error"].as_str().unwrap_or("unknown error");
        return Err(format!("Server error: {}", msg).into());
    }
    Ok(value)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    let value = match &cli.command {
        Commands::Levels => call(&client, &cli.url, "/levels", None)?,
        Commands::Topics => call(&client, &cli.url, "/topics", None)?,
        Commands::Generate { level, topic } => call(
            &client,
            &cli.url,
            "/generate-sentence",
            Some(json!({ "level": level, "topic": topic })),
        )?,
        Commands::Audio { text } => call(
            &client,
            &cli.url,
            "/generate-audio",
            Some(json!({ "text": text })),
        )?,
        Commands::Export {
            sentence,
            translation,
        } => call(
            &client,
            &cli.url,
            "/export-anki",
            Some(json!({ "sentence": sentence, "translation": translation })),
        )?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match cli.command {
        Commands::Levels => {
            if let Some(levels) = value["levels"].as_object() {
                for (code, desc) in levels {
                    println!("{:<4} {}", code, desc.as_str().unwrap_or(""));
                }
            }
        }
        Commands::Topics => {
            for topic in value["topics"].as_array().into_iter().flatten() {
                println!("{}", topic.as_str().unwrap_or(""));
            }
        }
        Commands::Generate { .. } => {
            let analysis = &value["analysis"];
            println!("{}", value["sentence"].as_str().unwrap_or(""));
            println!("  = {}", analysis["translation"].as_str().unwrap_or(""));
            println!("  Grammar: {}", analysis["grammar"]["structure"].as_str().unwrap_or(""));
            for variation in analysis["variations"].as_array().into_iter().flatten() {
                println!("  ~ {}", variation.as_str().unwrap_or(""));
            }
        }
        Commands::Audio { .. } => {
            println!("{}", value["audio_url"].as_str().unwrap_or(""));
        }
        Commands::Export { .. } => {
            println!("{}", value["csv_format"].as_str().unwrap_or(""));
        }
    }

    Ok(())
}
