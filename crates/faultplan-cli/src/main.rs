use std::path::PathBuf;
use std::process;

use clap::Parser;
use faultplan::campaign::Campaign;
use faultplan::config::{Config, InjectionMode, ListStrategy};
use faultplan::shard::ShardSpec;
use tracing::{error, info};

/// Generate fault-injection lists from instruction profiles.
#[derive(Parser, Debug)]
#[command(name = "faultplan", version)]
struct Cli {
    /// Campaign configuration
    #[arg(short, long, default_value = "faultplan.toml")]
    config: PathBuf,
    /// Override the injection mode: rf, inst_value or inst_address
    #[arg(long)]
    mode: Option<InjectionMode>,
    /// Override the list strategy: per_site or random
    #[arg(long)]
    strategy: Option<ListStrategy>,
    /// Index of the shard generated by this process
    #[arg(long)]
    shard_index: Option<usize>,
    /// Number of shards the eligible sites are split into
    #[arg(long)]
    shard_total: Option<usize>,
    /// Seed of the random source
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = tracing::Level::INFO)]
    log_level: tracing::Level,
}

/// Load the configuration and apply the command line overrides.
fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load(&cli.config)?;

    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    if cli.shard_index.is_some() || cli.shard_total.is_some() {
        config.shard = ShardSpec::new(
            cli.shard_index.unwrap_or(config.shard.index()),
            cli.shard_total.unwrap_or(config.shard.total()),
        )?;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli)?;

    for summary in Campaign::new(&config).run()? {
        let records: usize = summary.lists.iter().map(|list| list.records).sum();
        info!(
            app = %summary.app,
            lists = summary.lists.len(),
            records,
            "done"
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    if let Err(e) = run(&cli) {
        error!("{e}");
        eprintln!("error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("faultplan").chain(args.iter().copied())).unwrap()
    }

    fn write_config(dir: &std::path::Path, body: &str) -> PathBuf {
        let path = dir.join("faultplan.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn no_arguments_required() {
        let cli = cli(&[]);
        assert_eq!(cli.config, PathBuf::from("faultplan.toml"));
        assert_eq!(cli.log_level, tracing::Level::INFO);
        assert!(cli.mode.is_none());
    }

    #[test]
    fn overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "shard = { index = 0, total = 4 }\n");
        let path = path.to_str().unwrap();

        let config = load_config(&cli(&[
            "--config",
            path,
            "--shard-index",
            "3",
            "--seed",
            "5",
            "--strategy",
            "random",
            "--mode",
            "rf",
        ]))
        .unwrap();

        assert_eq!(config.shard, ShardSpec::new(3, 4).unwrap());
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.strategy, ListStrategy::Random);
        assert_eq!(config.mode, InjectionMode::Rf);
    }

    #[test]
    fn invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "");
        let path = path.to_str().unwrap();

        assert!(load_config(&cli(&["--config", path, "--shard-index", "1"])).is_err());
        assert!(load_config(&cli(&["--config", path, "--mode", "rf"])).is_err());
    }

    #[test]
    fn unknown_mode_is_rejected_by_the_parser() {
        let args = ["faultplan", "--mode", "memory"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
