//! venuekb-cli: operator CLI for the VenueKB HTTP API
//!
//! # Subcommands
//! - `extract --venue <id> (--pass <name> | --all) <file>`: run extraction on a transcript file
//! - `onboarding --venue <id> [--replace] <answers.json>` : generate entries from onboarding answers
//! - `pending --venue <id>`                                : list entries held for review
//! - `approve <id>` / `reject <id>`                        : resolve a held entry
//! - `progress --venue <id>`                               : readiness score per section
//! - `status`                                              : show server health

use std::collections::BTreeMap;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8766";

/// Extraction runs one model call per chunk per pass
const EXTRACT_TIMEOUT_SECS: u64 = 600;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "venuekb-cli", version, about = "VenueKB knowledge extraction and review")]
struct Cli {
    /// VenueKB HTTP server URL (overrides VENUEKB_HTTP_URL env var)
    #[arg(long, env = "VENUEKB_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// Print the raw JSON response instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract knowledge entries from a transcript file
    Extract {
        #[arg(long)]
        venue: String,

        /// Single pass: pricing, capacity, policies, amenities, brand_voice, handoff
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        pass: Option<String>,

        /// Run every pass in order
        #[arg(long)]
        all: bool,

        /// Transcript text file
        file: String,
    },

    /// Generate entries from a JSON array of {section, question, answer}
    Onboarding {
        #[arg(long)]
        venue: String,

        /// Delete previously generated onboarding entries first
        #[arg(long)]
        replace: bool,

        file: String,
    },

    /// List entries held for review
    Pending {
        #[arg(long)]
        venue: String,
    },

    /// Approve a held entry (makes it live)
    Approve { id: String },

    /// Reject a held entry (deletes it)
    Reject { id: String },

    /// Show the venue readiness score
    Progress {
        #[arg(long)]
        venue: String,
    },

    /// Show VenueKB server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChunkFailure {
    pub pass: String,
    pub chunk_index: usize,
    pub error: String,
}

/// Counters returned for one pass or one onboarding run
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ReportSummary {
    pub extracted: usize,
    pub saved: usize,
    pub held_for_review: usize,
    pub skipped_duplicates: usize,
    pub rejected_malformed: usize,
    pub rejected_ungrounded: usize,
    pub store_failures: usize,
    pub chunks: usize,
    pub chunk_failures: Vec<ChunkFailure>,
}

impl ReportSummary {
    pub fn has_failures(&self) -> bool {
        !self.chunk_failures.is_empty() || self.store_failures > 0
    }
}

#[derive(Debug, Deserialize)]
pub struct PassSummary {
    pub pass: String,
    #[serde(flatten)]
    pub report: ReportSummary,
}

#[derive(Debug, Deserialize)]
pub struct PendingEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub confidence: Option<f64>,
}

// ============================================================================
// Output formatting
// ============================================================================

pub fn format_report(label: &str, r: &ReportSummary) -> String {
    let mut out = format!(
        "{:<12} extracted {:>3}  saved {:>3} (held {})  duplicates {}  malformed {}  ungrounded {}  store failures {}",
        label,
        r.extracted,
        r.saved,
        r.held_for_review,
        r.skipped_duplicates,
        r.rejected_malformed,
        r.rejected_ungrounded,
        r.store_failures,
    );
    for f in &r.chunk_failures {
        out.push_str(&format!(
            "\n  ! {} chunk {} failed: {}",
            f.pass, f.chunk_index, f.error
        ));
    }
    out
}

pub fn format_pending(entry: &PendingEntry) -> String {
    let confidence = entry
        .confidence
        .map(|c| format!("{:.0}%", c * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "{} [{}] confidence {}\n  Q: {}\n  A: {}",
        entry.id, entry.category, confidence, entry.question, entry.answer
    )
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send a request and return the JSON body, failing on non-2xx with the server's message.
fn send(request: reqwest::blocking::RequestBuilder, url: &str) -> anyhow::Result<serde_json::Value> {
    let resp = request
        .send()
        .with_context(|| format!("connection failed to {}", url))?;
    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or_default();
    if !status.is_success() {
        let msg = body["error"].as_str().unwrap_or("unknown error");
        bail!("server returned {}: {}", status, msg);
    }
    Ok(body)
}

fn print_json(body: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}

/// Returns true when any chunk or write failed.
fn do_extract(
    server: &str,
    venue: &str,
    pass: Option<&str>,
    file: &str,
    json: bool,
) -> anyhow::Result<bool> {
    let transcript = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read transcript {}", file))?;
    let client = client(EXTRACT_TIMEOUT_SECS)?;

    let (url, body) = match pass {
        Some(pass) => (
            format!("{}/extract", server),
            serde_json::json!({ "venue_id": venue, "transcript": transcript, "pass": pass }),
        ),
        None => (
            format!("{}/extract/all", server),
            serde_json::json!({ "venue_id": venue, "transcript": transcript }),
        ),
    };
    let resp = send(client.post(&url).json(&body), &url)?;
    if json {
        print_json(&resp)?;
    }

    match pass {
        Some(pass) => {
            let report: ReportSummary = serde_json::from_value(resp["report"].clone())?;
            if !json {
                println!("{}", format_report(pass, &report));
            }
            Ok(report.has_failures())
        }
        None => {
            let passes: Vec<PassSummary> = serde_json::from_value(resp["passes"].clone())?;
            let totals: ReportSummary = serde_json::from_value(resp["totals"].clone())?;
            if !json {
                for p in &passes {
                    println!("{}", format_report(&p.pass, &p.report));
                }
                println!("{}", format_report("total", &totals));
            }
            Ok(totals.has_failures())
        }
    }
}

fn do_onboarding(
    server: &str,
    venue: &str,
    replace: bool,
    file: &str,
    json: bool,
) -> anyhow::Result<bool> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read answers {}", file))?;
    let answers: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", file))?;
    if !answers.is_array() {
        bail!("{} must contain a JSON array of answers", file);
    }

    let url = format!("{}/onboarding", server);
    let body = serde_json::json!({
        "venue_id": venue,
        "answers": answers,
        "replace_existing": replace,
    });
    let resp = send(client(EXTRACT_TIMEOUT_SECS)?.post(&url).json(&body), &url)?;
    let report: ReportSummary = serde_json::from_value(resp["report"].clone())?;
    if json {
        print_json(&resp)?;
    } else {
        println!("{}", format_report("onboarding", &report));
    }
    Ok(report.has_failures())
}

fn do_pending(server: &str, venue: &str, json: bool) -> anyhow::Result<()> {
    let url = format!("{}/review/{}", server, venue);
    let resp = send(client(DEFAULT_TIMEOUT_SECS)?.get(&url), &url)?;
    if json {
        return print_json(&resp);
    }

    let entries: Vec<PendingEntry> = serde_json::from_value(resp["entries"].clone())?;
    if entries.is_empty() {
        eprintln!("No entries pending review for venue {}", venue);
        return Ok(());
    }
    for entry in &entries {
        println!("{}\n", format_pending(entry));
    }
    Ok(())
}

fn do_review(server: &str, id: &str, decision: &str, json: bool) -> anyhow::Result<()> {
    let url = format!("{}/review", server);
    let body = serde_json::json!({ "id": id, "decision": decision });
    let resp = send(client(DEFAULT_TIMEOUT_SECS)?.post(&url).json(&body), &url)?;
    if json {
        return print_json(&resp);
    }
    println!("{} {}", resp["outcome"].as_str().unwrap_or(decision), id);
    Ok(())
}

fn do_progress(server: &str, venue: &str, json: bool) -> anyhow::Result<()> {
    let url = format!("{}/progress", server);
    let body = serde_json::json!({ "venue_id": venue });
    let resp = send(client(DEFAULT_TIMEOUT_SECS)?.post(&url).json(&body), &url)?;
    if json {
        return print_json(&resp);
    }

    let sections: BTreeMap<String, String> = serde_json::from_value(resp["sections"].clone())?;
    println!("Readiness: {:.0}/100", resp["score"].as_f64().unwrap_or(0.0));
    for (section, state) in &sections {
        println!("  {:<16} {}", section, state);
    }
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client(10)?.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("VenueKB server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
            println!("PostgreSQL:     {}", body["postgresql"].as_str().unwrap_or("?"));
            println!("Model:          {}", body["model"].as_str().unwrap_or("?"));
            println!("Entries:        {}", body["knowledge_entries"]);
            println!("Socket:         {}", body["socket"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            eprintln!("venuekb-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("venuekb-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();
    let json = cli.json;

    let result = match cli.command {
        Commands::Extract {
            venue,
            pass,
            all: _,
            file,
        } => do_extract(&server, &venue, pass.as_deref(), &file, json),
        Commands::Onboarding {
            venue,
            replace,
            file,
        } => do_onboarding(&server, &venue, replace, &file, json),
        Commands::Pending { venue } => do_pending(&server, &venue, json).map(|_| false),
        Commands::Approve { id } => do_review(&server, &id, "approve", json).map(|_| false),
        Commands::Reject { id } => do_review(&server, &id, "reject", json).map(|_| false),
        Commands::Progress { venue } => do_progress(&server, &venue, json).map(|_| false),
        Commands::Status => do_status(&server).map(|_| false),
    };

    match result {
        Ok(false) => {}
        // Partial run: entries that were saved stay saved
        Ok(true) => std::process::exit(2),
        Err(e) => {
            eprintln!("venuekb-cli: {:#}", e);
            std::process::exit(1);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
