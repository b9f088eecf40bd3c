//! `pawsense assess` - run the submission pipeline against the backend

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;
use tracing::info;

use pawsense_core::acquire::{self, ImageSource, PathPicker};
use pawsense_core::context::{FileContextStore, SubjectKind};
use pawsense_core::handoff::LogHandoff;
use pawsense_core::pipeline::{AttemptOutcome, SubmissionPipeline};
use pawsense_core::present;
use pawsense_core::transport::{AuthenticatedTransport, StaticTokens};

use crate::config::PawsenseConfig;

#[derive(Args)]
pub struct AssessArgs {
    /// Photo to assess
    #[arg(long)]
    pub image: PathBuf,

    /// Species of the pet ("cat", "dog", ...)
    #[arg(long)]
    pub species: String,

    /// Automatic retries for retryable failures
    #[arg(long, default_value_t = 1)]
    pub retries: u32,
}

pub async fn run(args: AssessArgs) -> Result<()> {
    let config = PawsenseConfig::load()?;

    let Some(flow) = SubjectKind::from_hint(&args.species) else {
        bail!(
            "unrecognized species {:?}; expected a dog or cat synonym",
            args.species
        );
    };
    let Some(token) = config.token.clone() else {
        bail!("no session token configured; set PAWSENSE_TOKEN or `token` in config.toml");
    };

    let tokens = Arc::new(StaticTokens::new(token));
    let transport = Arc::new(AuthenticatedTransport::with_timeout(
        config.base_url.clone(),
        tokens.clone(),
        config.timeout,
    )?);
    let store = Arc::new(FileContextStore::new(&config.config_dir));
    let pipeline = SubmissionPipeline::new(
        flow,
        tokens,
        transport,
        store,
        Arc::new(LogHandoff::new()),
    );

    let mut rx = pipeline.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(update) = rx.recv().await {
            println!("  [{:>3}%] {:?}", update.percent, update.stage);
        }
    });

    let picker = PathPicker::new(&args.image);
    let Some(image) = acquire::acquire(&picker, ImageSource::Library).await? else {
        bail!("no image selected");
    };

    let mut outcome = pipeline.submit(image, &args.species).await?;
    let mut retries_left = args.retries;
    while let Some(error) = outcome.failure() {
        if !error.retryable() || retries_left == 0 {
            break;
        }
        retries_left -= 1;
        info!(%error, retries_left, "retrying with the same photo");
        outcome = pipeline.retry().await?;
    }

    // Close the progress channel so the printer task finishes.
    drop(pipeline);
    let _ = printer.await;

    match outcome {
        AttemptOutcome::Success(payload) => {
            println!(
                "Pain level: {} (confidence {:.2})",
                payload.pain_level, payload.confidence
            );
            if !payload.extra.is_empty() {
                println!("{}", serde_json::to_string_pretty(&payload.extra)?);
            }
            Ok(())
        }
        AttemptOutcome::Failed(error) => {
            let notice = present::notice(&error);
            eprintln!("{}", notice.title);
            eprintln!("  {}", notice.body);
            for line in &notice.guidance {
                eprintln!("  - {line}");
            }
            bail!("assessment failed: {error}")
        }
    }
}
