//! Stream a generated HTML page for a prompt and save the final preview.

mod cli;

use std::io::Write as _;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;
use preview_stream::prelude::*;
use tracing::info;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    preview_stream::observability::init_observability();

    let cli = Cli::parse();
    let transport = HttpTransport::new(cli.client_config()?)?;
    let mut builder = Generator::builder()
        .transport(Arc::new(transport))
        .record_parser(cli.format.parser())
        .file_name(cli.file_name.clone());
    if let Some(timeout) = cli.timeout() {
        builder = builder.timeout(timeout);
    }
    let generator = builder.build()?;

    let mut run = generator.start_stream(cli.request()).await?;
    info!(target_id = run.target_id(), "session started");
    while let Some(event) = run.next_event().await {
        report(&event, cli.events)?;
    }

    let Some(output) = settle(run.finish().await)? else {
        return Ok(ExitCode::FAILURE);
    };

    let content = output.into_file(&cli.file_name);
    match &cli.output {
        Some(path) => write_output(path, &content)?,
        None if !cli.events => println!("{content}"),
        None => {}
    }
    Ok(ExitCode::SUCCESS)
}

/// A failed session has already shown its `Error` event, so it maps to
/// `None` rather than an error that would be printed a second time.
fn settle(outcome: Result<SessionOutput, PreviewError>) -> anyhow::Result<Option<SessionOutput>> {
    match outcome {
        Ok(output) => Ok(Some(output)),
        Err(PreviewError::Failed(failure)) => {
            if failure.is_auth_expired() {
                eprintln!("session token rejected, log in again and retry");
            }
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn report(event: &Event, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        let line = serde_json::to_string(event).context("failed to encode event")?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
        return Ok(());
    }
    match event {
        Event::Status { message } => eprintln!("{message}"),
        Event::File { name, content } => eprint!("\r\x1b[K{name}: {} chars", content.chars().count()),
        Event::Complete => eprintln!("\ngeneration complete"),
        Event::Error { message } => eprintln!("\nerror: {message}"),
    }
    Ok(())
}

fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = content.len(), "preview written");
    Ok(())
}
