//! Generation of every injection list of every configured workload.

use std::fs::File;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info};

use crate::catalog::{self, KernelCounts};
use crate::config::{AppConfig, Config, ConfigError, ListStrategy, Target};
use crate::emit::{EmitError, PerSiteEmitter, RandomFaultEmitter};
use crate::error::Error;
use crate::groups::{InjectionGroup, group_by_invocation};
use crate::sink::LineSink;

/// One written list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSummary {
    pub path: PathBuf,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub app: String,
    pub lists: Vec<ListSummary>,
}

/// Drives list generation over the apps of a [`Config`] with a single random source.
pub struct Campaign<'c, R> {
    config: &'c Config,
    rng: R,
}

impl<'c> Campaign<'c, StdRng> {
    /// Seeded from [`Config::seed`] if present, otherwise from the OS.
    #[must_use]
    pub fn new(config: &'c Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }
}

impl<'c, R> Campaign<'c, R>
where
    R: rand::Rng,
{
    pub fn with_rng(config: &'c Config, rng: R) -> Self {
        Self { config, rng }
    }

    /// Process every app in order, stopping at the first one that fails.
    pub fn run(&mut self) -> Result<Vec<WorkloadSummary>, Error> {
        let config = self.config;
        config
            .apps
            .iter()
            .map(|app| self.run_app(app))
            .collect()
    }

    /// Write all lists of one app.
    ///
    /// Lists are independent: a list that cannot be written does not stop the remaining ones,
    /// but the app still fails afterwards.
    pub fn run_app(&mut self, app: &AppConfig) -> Result<WorkloadSummary, Error> {
        let config = self.config;
        info!(app = %app.name, "creating lists");

        let list_dir = app.injection_list_dir();
        std::fs::create_dir_all(&list_dir).map_err(|source| EmitError::Create {
            path: list_dir.clone(),
            source,
        })?;

        let rows = catalog::read_counts(&app.count_log_path(), config.inst_groups.len())?;
        if catalog::total_count(&rows, config.total_count_column()) == 0 {
            return Err(Error::ZeroInstructionCount {
                app: app.name.clone(),
            });
        }

        let targets = config.targets();
        let outcomes = match config.strategy {
            ListStrategy::PerSite => {
                let sites = catalog::read_sites(&app.site_catalog_path())?;
                let groups = group_by_invocation(config.exclusion_set().filter(sites));
                targets
                    .iter()
                    .map(|&(target, bfm)| {
                        let path = app.list_path(config.mode, target, bfm, None);
                        let result = self.per_site_list(&path, &groups, target);
                        (path, result)
                    })
                    .collect::<Vec<_>>()
            }
            ListStrategy::Random => targets
                .iter()
                .map(|&(target, bfm)| {
                    let path =
                        app.list_path(config.mode, target, bfm, Some(config.num_injections));
                    let result = self.random_fault_list(&path, app, &rows, target);
                    (path, result)
                })
                .collect::<Vec<_>>(),
        };

        let total = outcomes.len();
        let mut lists = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (path, result) in outcomes {
            match result {
                Ok(records) => lists.push(ListSummary { path, records }),
                Err(err) => {
                    error!(app = %app.name, path = %path.display(), %err, "list failed");
                    failures.push(err);
                }
            }
        }

        info!(app = %app.name, dir = %list_dir.display(), "output written");

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(WorkloadSummary {
                app: app.name.clone(),
                lists,
            }),
            Some(first) => Err(Error::ListsFailed {
                app: app.name.clone(),
                failed,
                total,
                first,
            }),
        }
    }

    fn per_site_list(
        &mut self,
        path: &Path,
        groups: &[InjectionGroup],
        target: Target,
    ) -> Result<usize, EmitError> {
        let config = self.config;
        let Target::Group(igid) = target else {
            return Err(ConfigError::UnsupportedMode {
                mode: config.mode,
                strategy: config.strategy,
            }
            .into());
        };

        let emitter = PerSiteEmitter::from_config(config);
        self.write_list(path, |rng, sink| {
            emitter
                .emit(groups, igid as usize, rng, sink)
                .map_err(EmitError::Sink)
        })
    }

    fn random_fault_list(
        &mut self,
        path: &Path,
        app: &AppConfig,
        rows: &[KernelCounts],
        target: Target,
    ) -> Result<usize, EmitError> {
        let emitter = RandomFaultEmitter::from_config(self.config);
        self.write_list(path, |rng, sink| emitter.emit(app, rows, target, rng, sink))
    }

    /// Create (or truncate) `path` and fill it through `fill`.
    fn write_list<F>(&mut self, path: &Path, fill: F) -> Result<usize, EmitError>
    where
        F: FnOnce(&mut R, &mut LineSink<File>) -> Result<usize, EmitError>,
    {
        info!(path = %path.display(), "writing list");
        let file = File::create(path).map_err(|source| EmitError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        let mut sink = LineSink::new(file);
        let records = fill(&mut self.rng, &mut sink).map_err(|err| err.at(path))?;
        sink.flush().map_err(|source| EmitError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(records)
    }
}
