use std::io::Write as _;
use std::sync::Arc;

use leadflow::config::AppConfig;
use leadflow::generation::{GeminiProvider, GenerationClient};
use leadflow::pipeline::{FormSession, LeadSubmissionPipeline};
use leadflow::runner::{RunnerState, StepOutcome};
use leadflow::store::{FormStore, LeadStore, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    let slug = match std::env::args().nth(1) {
        Some(slug) => slug,
        None => anyhow::bail!("usage: leadflow <form-slug>"),
    };

    eprintln!("📋 Leadflow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Models: {}", config.models.join(", "));
    eprintln!();

    // ── Storage ─────────────────────────────────────────────────────
    let backend = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
    let forms: Arc<dyn FormStore> = backend.clone();
    let leads: Arc<dyn LeadStore> = backend;

    // ── Generation ──────────────────────────────────────────────────
    let provider = Arc::new(GeminiProvider::new(config.api_key.clone()));
    let client = GenerationClient::new(provider, config.models.clone())
        .with_call_timeout(config.call_timeout);
    let pipeline = LeadSubmissionPipeline::new(client, leads);

    // ── Session ─────────────────────────────────────────────────────
    let mut session = FormSession::start(forms, pipeline, &slug).await?;

    if *session.runner().state() == RunnerState::NotFound {
        eprintln!("No active form found for slug '{slug}'.");
        std::process::exit(1);
    }

    if let Some(form) = session.runner().form() {
        println!("{}\n", form.name);
    }

    let stdin = std::io::stdin();
    loop {
        match *session.runner().state() {
            RunnerState::Asking(_) => {
                if let Some(error) = session.runner().submit_error() {
                    println!("Submission failed: {error}. Press Enter to retry.");
                }
                let Some(question) = session.runner().current_question() else {
                    // Zero-question form: a single Enter submits
                    print!("Press Enter to submit: ");
                    std::io::stdout().flush()?;
                    let mut line = String::new();
                    stdin.read_line(&mut line)?;
                    session.answer(line.trim()).await;
                    continue;
                };

                let question = question.clone();
                if !question.options.is_empty() {
                    println!("Options: {}", question.options.join(" | "));
                }
                prompt(&session, &question.label);

                let mut line = String::new();
                if stdin.read_line(&mut line)? == 0 {
                    break;
                }
                let input = line.trim();

                if input == "/back" {
                    session.back();
                    continue;
                }
                if let StepOutcome::Rejected(reason) = session.answer(input).await {
                    println!("  {reason}");
                }
            }
            RunnerState::Intermediate => {
                println!("\nYour answers were submitted.");
                match session.expert_link() {
                    Some(link) => {
                        println!("  [1] See your personalized analysis");
                        println!("  [2] Talk to a specialist ({link})");
                        print!("> ");
                        std::io::stdout().flush()?;

                        let mut line = String::new();
                        stdin.read_line(&mut line)?;
                        if line.trim() == "2" {
                            println!("\nReach out here: {link}");
                            break;
                        }
                        session.choose_ai_result();
                    }
                    None => session.choose_ai_result(),
                }
            }
            RunnerState::ShowingResult => {
                if let Some(analysis) = session.ai_response() {
                    println!("\n{analysis}\n");
                }
                if let Some(form) = session.runner().form() {
                    for product in &form.products {
                        println!("• {} — {} ({})", product.name, product.price, product.cta_link);
                    }
                }
                break;
            }
            // Loading resolves inside start(); Submitting inside answer().
            _ => break,
        }
    }

    Ok(())
}

fn prompt(session: &FormSession, label: &str) {
    if let Some((current, total)) = session.runner().progress() {
        print!("[{current}/{total}] {label}: ");
    } else {
        print!("{label}: ");
    }
    let _ = std::io::stdout().flush();
}
