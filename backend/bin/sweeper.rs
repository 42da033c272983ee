use anyhow::Result;
use clap::{Arg, Command};
use linka::{
    db::{get_db_pool, DatabaseConfig},
    services::{EventHub, SweepPolicy, Sweeper},
    utils::{init_logging, config::Config},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = Command::new("sweeper")
        .about("Cool idle connections, end long-cooled ones and expire overdue missions")
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run a single sweep and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("interval-secs")
                .long("interval-secs")
                .help("Seconds between sweeps (defaults to SWEEP_INTERVAL_SECS)")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    info!("🧹 Starting Linka sweeper...");

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Standalone process: no sockets listen on this hub, clients pick changes up on their next fetch
    let sweeper = Sweeper::new(pool, EventHub::new(), SweepPolicy::from_config(&config));

    if matches.get_flag("once") {
        let report = sweeper.run_once().await?;
        info!(
            "✅ Sweep done: {} cooled, {} expired, {} missions expired, {} failed",
            report.cooled, report.expired, report.missions_expired, report.failed
        );
        return Ok(());
    }

    let interval_secs = matches
        .get_one::<u64>("interval-secs")
        .copied()
        .unwrap_or(config.sweep_interval_secs);
    info!("🔁 Sweeping every {}s", interval_secs);
    sweeper.run(interval_secs).await;

    Ok(())
}
