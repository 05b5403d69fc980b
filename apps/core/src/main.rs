// Deskflow V1 command-line entry point
// Runs one ticket through the intake pipeline and prints the result as JSON.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use deskflow::classify::{CategoryClassifier, NaiveBayesClassifier};
use deskflow::logging::init_tracing;
use deskflow::resolve::{HttpResolutionAssistant, NoAssistant, ResolutionAssistant};
use deskflow::{DeskConfig, IntakeHandle, IntakePipeline, TicketRequest};

const USAGE: &str = "usage: deskflow <title> <description> <submitter>";

fn build_assistant(config: &DeskConfig) -> Result<Arc<dyn ResolutionAssistant>> {
    match HttpResolutionAssistant::from_settings(&config.assistant)? {
        Some(assistant) => {
            info!("Resolution assistant enabled ({})", config.assistant.model);
            Ok(Arc::new(assistant))
        }
        None => {
            warn!("No assistant endpoint configured, AI fallback disabled");
            Ok(Arc::new(NoAssistant))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(env!("CARGO_PKG_NAME"))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [title, description, submitter] = args.as_slice() else {
        bail!(USAGE);
    };

    let config = DeskConfig::load().context("failed to load configuration")?;
    let classifier: Arc<dyn CategoryClassifier> = Arc::new(
        NaiveBayesClassifier::with_default_training().context("failed to train classifier")?,
    );
    let assistant = build_assistant(&config)?;

    let pipeline = Arc::new(IntakePipeline::from_config(&config, classifier, assistant));
    let handle = IntakeHandle::new(pipeline);

    let outcome = handle
        .submit(TicketRequest::new(title, description, submitter))
        .await
        .context("ticket intake failed")?;

    println!("{}", serde_json::to_string_pretty(&outcome.view())?);
    handle.shutdown().await?;
    Ok(())
}
