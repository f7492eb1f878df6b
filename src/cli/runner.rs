//! CLI runner - executes commands

use crate::cache::{CacheStore, MemoryCache, RedisCache};
use crate::cli::commands::{Cli, Commands};
use crate::collector::{Collector, CollectorHandle, RunOutcome};
use crate::collectors;
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;
use crate::source::{load_source_file, load_sources_dir, SourceCollector};
use std::sync::Arc;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { no_stagger } => self.run_pipeline(*no_stagger).await,
            Commands::Once { name } => self.run_once(name).await,
            Commands::List => self.list(),
            Commands::Validate => self.validate(),
        }
    }

    /// Build the cache store from CLI flags
    async fn cache(&self) -> Result<Arc<dyn CacheStore>> {
        match &self.cli.redis_url {
            Some(url) => {
                let cache = RedisCache::connect(url).await?;
                info!("connected to redis cache");
                Ok(Arc::new(cache))
            }
            None => {
                warn!("no redis url configured, using in-process cache; request endpoints in other processes will not see it");
                Ok(Arc::new(MemoryCache::new()))
            }
        }
    }

    /// Assemble the full collector set: built-in bespoke collectors plus
    /// one declarative collector per loaded source document.
    fn collectors(&self) -> Vec<Arc<dyn Collector>> {
        let mut set: Vec<Arc<dyn Collector>> = Vec::new();

        if !self.cli.skip_builtin {
            set.extend(collectors::builtin());
        }

        for config in load_sources_dir(&self.cli.sources_dir) {
            if !config.enabled {
                info!(source = %config.name, "source disabled, not scheduling");
                continue;
            }
            let name = config.name.clone();
            match SourceCollector::from_config(config) {
                Ok(collector) => set.push(Arc::new(collector)),
                Err(e) => {
                    warn!(source = %name, error = %e, "source excluded from schedule");
                }
            }
        }

        set
    }

    /// Start the scheduler and run until interrupted
    async fn run_pipeline(&self, no_stagger: bool) -> Result<()> {
        let cache = self.cache().await?;

        let mut scheduler = Scheduler::new(cache);
        if no_stagger {
            scheduler = scheduler.without_stagger();
        }
        for collector in self.collectors() {
            scheduler.register(collector);
        }
        if scheduler.is_empty() {
            return Err(Error::config(
                "no collectors configured; check the sources directory",
            ));
        }

        scheduler.start();
        tokio::signal::ctrl_c().await.map_err(Error::Io)?;
        info!("interrupt received");
        scheduler.shutdown().await;
        Ok(())
    }

    /// Run a single collector once and report the outcome
    async fn run_once(&self, name: &str) -> Result<()> {
        let collector = self
            .collectors()
            .into_iter()
            .find(|c| c.descriptor().name == name)
            .ok_or_else(|| Error::config(format!("unknown collector '{name}'")))?;

        let cache = self.cache().await?;
        let key = collector.descriptor().cache_key.clone();
        let handle = CollectorHandle::new(collector, cache);
        let result = handle.run_once().await;

        match result.outcome {
            RunOutcome::Success { bytes, records } => {
                println!(
                    "{name}: ok in {}ms, {bytes} bytes{} -> {key}",
                    result.duration.as_millis(),
                    records.map_or(String::new(), |r| format!(", {r} records")),
                );
                Ok(())
            }
            RunOutcome::Failed { kind, message } => Err(Error::Other(format!(
                "{name}: failed ({kind}) after {}ms: {message}",
                result.duration.as_millis()
            ))),
            RunOutcome::Skipped => Ok(()),
        }
    }

    /// Print all configured collectors
    fn list(&self) -> Result<()> {
        let collectors = self.collectors();
        if collectors.is_empty() {
            println!("no collectors configured");
            return Ok(());
        }

        println!(
            "{:<24} {:>10} {:>10}  {}",
            "NAME", "INTERVAL", "TTL", "CACHE KEY"
        );
        for collector in collectors {
            let d = collector.descriptor();
            println!(
                "{:<24} {:>9}s {:>9}s  {}",
                d.name,
                d.interval.as_secs(),
                d.cache_ttl.as_secs(),
                d.cache_key
            );
        }
        Ok(())
    }

    /// Validate every source document in the sources directory
    fn validate(&self) -> Result<()> {
        let dir = &self.cli.sources_dir;
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::config(format!("cannot read '{}': {e}", dir.display())))?;

        let mut failures = 0usize;
        let mut checked = 0usize;
        let mut paths: Vec<_> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml" | "yml")
                )
            })
            .collect();
        paths.sort();

        for path in paths {
            checked += 1;
            match load_source_file(&path) {
                Ok(config) => println!("ok    {} ({})", path.display(), config.name),
                Err(e) => {
                    failures += 1;
                    println!("ERROR {}: {e}", path.display());
                }
            }
        }

        if checked == 0 {
            println!("no source documents found in {}", dir.display());
        }
        if failures > 0 {
            return Err(Error::config(format!(
                "{failures} of {checked} source documents invalid"
            )));
        }
        Ok(())
    }
}
