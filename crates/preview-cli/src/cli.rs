use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use preview_stream::{
    ChatCompletionSseParser, ClientConfig, DataStreamParser, GenerateRequest, PreviewError,
    RecordParser,
};

#[derive(Debug, Parser)]
#[command(name = "preview")]
#[command(version, about = "Stream a generated HTML page from a prompt", long_about = None)]
pub struct Cli {
    /// Target identifier sent upstream (for example a project id)
    #[arg(short, long, default_value = "local")]
    pub target: String,

    /// Generation endpoint URL (falls back to PREVIEW_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bearer token (falls back to PREVIEW_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Model name forwarded upstream (falls back to PREVIEW_MODEL)
    #[arg(long)]
    pub model: Option<String>,

    /// Record format of the response body
    #[arg(long, value_enum, default_value_t = RecordFormat::DataStream)]
    pub format: RecordFormat,

    /// Name of the generated file
    #[arg(long, default_value = preview_stream::DEFAULT_FILE_NAME)]
    pub file_name: String,

    /// Abort the session after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write the final file here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print every event as a JSON line on stdout
    #[arg(long)]
    pub events: bool,

    /// Description of the page to generate
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RecordFormat {
    /// `0:"<json string>"` lines
    DataStream,
    /// OpenAI-compatible `data: {json}` lines
    Sse,
}

impl RecordFormat {
    pub fn parser(self) -> Arc<dyn RecordParser> {
        match self {
            RecordFormat::DataStream => Arc::new(DataStreamParser::default()),
            RecordFormat::Sse => Arc::new(ChatCompletionSseParser),
        }
    }
}

impl Cli {
    pub fn request(&self) -> GenerateRequest {
        GenerateRequest::new(self.target.clone(), self.prompt.join(" "))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Flags win over environment variables. `--timeout-secs` also bounds the
    /// HTTP client, whose own limit covers the whole response body.
    pub fn client_config(&self) -> Result<ClientConfig, PreviewError> {
        let mut config = match &self.endpoint {
            Some(endpoint) => {
                let mut config = ClientConfig::new(endpoint.clone());
                config.token = non_empty_env("PREVIEW_TOKEN");
                config.model = non_empty_env("PREVIEW_MODEL");
                config
            }
            None => ClientConfig::from_env()?,
        };
        if let Some(token) = &self.token {
            config = config.token(token.clone());
        }
        if let Some(model) = &self.model {
            config = config.model(model.clone());
        }
        if let Some(timeout) = self.timeout() {
            config = config.timeout(timeout);
        }
        Ok(config)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
