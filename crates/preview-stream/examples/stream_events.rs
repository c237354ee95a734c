use std::sync::Arc;

use preview_stream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), PreviewError> {
    preview_stream::observability::init_observability();

    let generator = Generator::builder()
        .transport(Arc::new(HttpTransport::from_env()?))
        .build()?;

    let mut run = generator
        .start_stream(GenerateRequest::new("example", "A pricing table with three tiers"))
        .await?;

    while let Some(event) = run.next_event().await {
        match event {
            Event::Status { message } => eprintln!("{message}"),
            Event::File { name, content } => eprintln!("{name}: {} chars", content.len()),
            Event::Complete => eprintln!("done"),
            Event::Error { message } => eprintln!("generation error: {message}"),
        }
    }

    let output = run.finish().await?;
    println!("{}", output.into_file(preview_stream::DEFAULT_FILE_NAME));
    Ok(())
}
