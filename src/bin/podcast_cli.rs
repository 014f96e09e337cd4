//! Command-line batch runner.
//!
//! Runs one batch through the same pipeline as the HTTP server and prints the synthesis, the
//! podcast path, and every citation. Configuration comes from the same environment variables.
use anyhow::{Context, Result, bail};
use clap::Parser;
use paper_podcast::{
    config::Config,
    logging,
    processing::{BatchRequest, PipelineService, SynthesisResult, sanitize::split_comma_list},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "paper-podcast-cli",
    about = "Summarize papers and web pages into narrated audio"
)]
struct Cli {
    /// Local PDF file (repeatable).
    #[arg(long = "pdf")]
    pdfs: Vec<PathBuf>,
    /// DOI to resolve through CrossRef (repeatable).
    #[arg(long = "doi")]
    dois: Vec<String>,
    /// Web page URL (repeatable).
    #[arg(long = "url")]
    urls: Vec<String>,
    /// Candidate topics, comma-separated or repeated.
    #[arg(long)]
    topics: Vec<String>,
    /// Print the raw result as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_request(self) -> BatchRequest {
        BatchRequest {
            pdfs: self.pdfs,
            dois: self.dois,
            urls: self.urls,
            topics: self
                .topics
                .iter()
                .flat_map(|raw| split_comma_list(Some(raw)))
                .collect(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_cli_tracing();

    let cli = Cli::parse();
    let json = cli.json;
    let request = cli.into_request();
    if request.is_empty() {
        bail!("nothing to process: pass at least one --pdf, --doi, or --url");
    }

    let config = Config::from_env().context("failed to load configuration")?;
    let service =
        PipelineService::from_config(&config).context("failed to initialize pipeline")?;
    let result = service.run(request).await;

    if json {
        let rendered =
            serde_json::to_string_pretty(&result).context("failed to serialize result")?;
        println!("{rendered}");
    } else {
        print_report(&result);
    }
    Ok(())
}

fn print_report(result: &SynthesisResult) {
    if result.synthesis.is_empty() {
        println!("No synthesis produced.");
    } else {
        println!("Synthesis:\n{}\n", result.synthesis);
    }
    match &result.synthesis_audio {
        Some(path) => println!("Podcast: {}", path.display()),
        None => println!("Podcast: (none)"),
    }

    println!("\nCitations ({}):", result.citations.len());
    for citation in &result.citations {
        println!("- {} [{}]", citation.source, citation.topic);
        println!("  {}", citation.summary);
        if let Some(audio) = &citation.audio {
            println!("  audio: {}", audio.display());
        }
    }
}
