use anyhow::Result;
use clap::Parser;
use classmedia_rs::{cli, launch};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    let default_level = if args.verbose { "classmedia_rs=debug" } else { "classmedia_rs=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = args.to_config()?;
    let jobs = args.build_jobs()?;
    let outcomes = launch(&config, jobs).await?;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.outcome {
            Ok(_) => eprintln!("✅ {} ({:.2}s)", outcome.label, outcome.elapsed.as_secs_f64()),
            Err(e) => {
                failed += 1;
                eprintln!("❌ {}: {}", outcome.label, e);
            }
        }
        println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);
    }

    if failed > 0 {
        anyhow::bail!("{} of {} media failed", failed, outcomes.len());
    }
    Ok(())
}
