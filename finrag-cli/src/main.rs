use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use finrag::{Session, TurnOutcome};
use finrag_cli::{Args, build_router, resolve_config};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "> Question: ";

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("finrag=info,finrag_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    info!(
        corpus_dir = %config.corpus_dir.display(),
        collection = %config.collection_name,
        top_k = config.top_k,
        "starting"
    );
    let router = Arc::new(build_router(&args, config).await?);

    match router.ensure_collection().await {
        Ok(outcome) => info!(?outcome, "collection ready"),
        Err(e) if args.build_only => return Err(e.into()),
        Err(e) => warn!(error = %e, "collection unavailable, retrying on first retrieval question"),
    }
    if args.build_only {
        return Ok(());
    }

    let session = Session::new(router);
    if let Some(question) = &args.ask {
        let outcome = session.turn(question).await;
        if let Some(message) = outcome.message() {
            println!("{message}");
        }
        if let TurnOutcome::Failed(message) = outcome {
            anyhow::bail!(message);
        }
        return Ok(());
    }

    let mut editor = DefaultEditor::new()?;
    println!("Ask about your statements. Type 'exit' to quit.");
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = editor.add_history_entry(line.as_str()) {
                        debug!(error = %e, "history entry not recorded");
                    }
                }
                let outcome = session.turn(&line).await;
                if outcome == TurnOutcome::Exit {
                    break;
                }
                if let Some(message) = outcome.message() {
                    println!("{message}");
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
