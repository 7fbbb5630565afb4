use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use scene_cast::core::config::Config;
use scene_cast::services::aggregator::{AggregatorInput, CharacterAggregator};
use scene_cast::services::{analysis, setup};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load config
    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with the project's scenes.");
            return Err(e);
        }
    };

    // 2. Fill in identity if missing
    setup::run_setup(&mut config)?;

    // 3. Start aggregation
    let analyzer = analysis::create_analyzer(&config)?;
    let mut aggregator = CharacterAggregator::new(Arc::from(analyzer));
    let mut progress = aggregator.subscribe();
    aggregator.configure(AggregatorInput::from_config(&config));

    let pb = ProgressBar::new(aggregator.progress().total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    // 4. Follow progress until settled or interrupted
    let mut interrupted = false;
    loop {
        let current = *progress.borrow_and_update();
        pb.set_length(current.total as u64);
        pb.set_position(current.processed as u64);
        if !current.is_loading {
            break;
        }

        tokio::select! {
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                aggregator.detach();
                interrupted = true;
                break;
            }
        }
    }

    aggregator.settle().await;
    if interrupted {
        pb.abandon_with_message("Interrupted");
    } else {
        pb.finish_with_message("Analysis complete");
    }

    // 5. Report
    let snapshot = aggregator.snapshot();
    eprintln!(
        "{} characters from {}/{} scenes",
        snapshot.characters.len(),
        snapshot.processed,
        snapshot.total
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
