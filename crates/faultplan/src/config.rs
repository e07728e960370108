//! Campaign configuration, read once from TOML and passed by reference afterwards.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::filter::ExclusionSet;
use crate::groups::InstructionGroups;
use crate::shard::{InvalidShard, ShardSpec};

/// Name of the directory, inside an app's log directory, that receives the lists.
pub const INJECTION_LIST_DIR: &str = "injection-list";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid shard: {0}")]
    Shard(#[from] InvalidShard),
    #[error("Instruction group {igid} is not defined, only {groups} groups are configured")]
    UnknownGroup { igid: u32, groups: usize },
    #[error("App `{0}` is configured more than once")]
    DuplicateApp(String),
    #[error("Unknown injection mode `{0}`, expected rf, inst_value or inst_address")]
    UnknownMode(String),
    #[error("Unknown list strategy `{0}`, expected per_site or random")]
    UnknownStrategy(String),
    #[error("App `{app}` has no register count for kernel `{kernel}`")]
    MissingRegisterCount { app: String, kernel: String },
    #[error("The {strategy} strategy does not support {mode} mode")]
    UnsupportedMode {
        mode: InjectionMode,
        strategy: ListStrategy,
    },
}

/// What the injected fault corrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMode {
    /// Any live register of the register file.
    Rf,
    /// The destination value of an instruction.
    #[default]
    InstValue,
    /// The address of a memory instruction.
    InstAddress,
}

impl InjectionMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rf => "rf",
            Self::InstValue => "inst_value",
            Self::InstAddress => "inst_address",
        }
    }
}

impl fmt::Display for InjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InjectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rf" => Ok(Self::Rf),
            "inst_value" => Ok(Self::InstValue),
            "inst_address" => Ok(Self::InstAddress),
            other => Err(ConfigError::UnknownMode(other.to_owned())),
        }
    }
}

/// How sites are chosen for a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStrategy {
    /// Every eligible site of the shard, each with a fixed number of sampled threads.
    #[default]
    PerSite,
    /// A fixed number of dynamic instructions drawn from the whole count log.
    Random,
}

impl fmt::Display for ListStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PerSite => "per_site",
            Self::Random => "random",
        })
    }
}

impl FromStr for ListStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_site" | "per-site" => Ok(Self::PerSite),
            "random" => Ok(Self::Random),
            other => Err(ConfigError::UnknownStrategy(other.to_owned())),
        }
    }
}

/// Instructions a list draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Rf,
    Group(u32),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rf => f.write_str("rf"),
            Self::Group(igid) => write!(f, "{igid}"),
        }
    }
}

/// Bit-flip models to generate for one instruction group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetBfms {
    pub igid: u32,
    pub bfms: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub name: String,
    pub log_dir: PathBuf,
    /// Instruction-count log, relative to `log_dir`.
    #[serde(default = "default_count_log")]
    pub count_log: PathBuf,
    /// Site catalog, relative to `log_dir`.
    #[serde(default = "default_site_catalog")]
    pub site_catalog: PathBuf,
    /// Registers used by each kernel, required by register-file lists.
    #[serde(default)]
    pub num_regs: BTreeMap<String, u32>,
}

fn default_count_log() -> PathBuf {
    PathBuf::from("inst-counts.txt")
}

fn default_site_catalog() -> PathBuf {
    PathBuf::from("inst-sites.txt")
}

impl AppConfig {
    pub fn new(name: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            log_dir: log_dir.into(),
            count_log: default_count_log(),
            site_catalog: default_site_catalog(),
            num_regs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn count_log_path(&self) -> PathBuf {
        self.log_dir.join(&self.count_log)
    }

    #[must_use]
    pub fn site_catalog_path(&self) -> PathBuf {
        self.log_dir.join(&self.site_catalog)
    }

    #[must_use]
    pub fn injection_list_dir(&self) -> PathBuf {
        self.log_dir.join(INJECTION_LIST_DIR)
    }

    /// `<log_dir>/injection-list/mode<mode>-igid<target>.bfm<bfm>[.<num_injections>].txt`
    #[must_use]
    pub fn list_path(
        &self,
        mode: InjectionMode,
        target: Target,
        bfm: u32,
        num_injections: Option<usize>,
    ) -> PathBuf {
        let name = match num_injections {
            Some(n) => format!("mode{mode}-igid{target}.bfm{bfm}.{n}.txt"),
            None => format!("mode{mode}-igid{target}.bfm{bfm}.txt"),
        };
        self.injection_list_dir().join(name)
    }

    pub fn registers(&self, kernel: &str) -> Result<u32, ConfigError> {
        self.num_regs
            .get(kernel)
            .copied()
            .ok_or_else(|| ConfigError::MissingRegisterCount {
                app: self.name.clone(),
                kernel: kernel.to_owned(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub mode: InjectionMode,
    pub strategy: ListStrategy,
    /// Records per random-fault list.
    pub num_injections: usize,
    /// Threads sampled per site in per-site lists.
    pub thread_samples: usize,
    pub shard: ShardSpec,
    /// Seed of the random source, drawn from the OS when absent.
    pub seed: Option<u64>,
    pub excluded_inst_types: Vec<u32>,
    /// Instruction types of each instruction group, indexed by igid.
    pub inst_groups: Vec<Vec<u32>>,
    /// Count column used by register-file lists.
    pub rf_count_igid: u32,
    /// Count column a workload's total instruction count is taken from.
    pub total_count_igid: u32,
    pub rf_bfms: Vec<u32>,
    pub inst_value: Vec<TargetBfms>,
    pub inst_address: Vec<TargetBfms>,
    pub apps: Vec<AppConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: InjectionMode::default(),
            strategy: ListStrategy::default(),
            num_injections: 100,
            thread_samples: 384,
            shard: ShardSpec::default(),
            seed: None,
            excluded_inst_types: ExclusionSet::DEFAULT.to_vec(),
            inst_groups: InstructionGroups::default().into_inner(),
            rf_count_igid: 6,
            total_count_igid: 7,
            rf_bfms: vec![0],
            inst_value: vec![TargetBfms {
                igid: 7,
                bfms: vec![0],
            }],
            inst_address: vec![TargetBfms {
                igid: 6,
                bfms: vec![0],
            }],
            apps: Vec::new(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check the cross-field constraints. Must be called again after modifying a loaded config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let groups = self.inst_groups.len();
        let referenced = [self.rf_count_igid, self.total_count_igid]
            .into_iter()
            .chain(self.inst_value.iter().map(|t| t.igid))
            .chain(self.inst_address.iter().map(|t| t.igid));
        for igid in referenced {
            if igid as usize >= groups {
                return Err(ConfigError::UnknownGroup { igid, groups });
            }
        }

        let mut names = HashSet::new();
        if let Some(app) = self.apps.iter().find(|app| !names.insert(app.name.as_str())) {
            return Err(ConfigError::DuplicateApp(app.name.clone()));
        }

        if self.strategy == ListStrategy::PerSite && self.mode == InjectionMode::Rf {
            return Err(ConfigError::UnsupportedMode {
                mode: self.mode,
                strategy: self.strategy,
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn exclusion_set(&self) -> ExclusionSet {
        self.excluded_inst_types.iter().copied().collect()
    }

    #[must_use]
    pub fn instruction_groups(&self) -> InstructionGroups {
        InstructionGroups::new(self.inst_groups.clone())
    }

    /// Every `(target, bfm)` pair of the configured mode, in configuration order.
    #[must_use]
    pub fn targets(&self) -> Vec<(Target, u32)> {
        let per_group = |table: &[TargetBfms]| {
            table
                .iter()
                .flat_map(|t| t.bfms.iter().map(|&bfm| (Target::Group(t.igid), bfm)))
                .collect::<Vec<_>>()
        };

        match self.mode {
            InjectionMode::Rf => self.rf_bfms.iter().map(|&bfm| (Target::Rf, bfm)).collect(),
            InjectionMode::InstValue => per_group(&self.inst_value),
            InjectionMode::InstAddress => per_group(&self.inst_address),
        }
    }

    /// Count column whose total decides whether a workload has anything to inject.
    #[must_use]
    pub fn total_count_column(&self) -> usize {
        match self.mode {
            InjectionMode::Rf => self.rf_count_igid as usize,
            _ => self.total_count_igid as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.mode, InjectionMode::InstValue);
        assert_eq!(config.thread_samples, 384);
        assert_eq!(config.targets(), vec![(Target::Group(7), 0)]);
        assert!(config.exclusion_set().contains(100));
        assert_eq!(config.instruction_groups().len(), 8);
    }

    #[test]
    fn full_document() {
        let config = Config::from_toml_str(
            r#"
            mode = "inst_address"
            strategy = "random"
            num_injections = 10
            thread_samples = 4
            shard = { index = 1, total = 3 }
            seed = 99
            excluded_inst_types = [100]
            rf_bfms = [0, 1]

            [[inst_address]]
            igid = 2
            bfms = [0, 1]

            [[inst_address]]
            igid = 6
            bfms = [3]

            [[apps]]
            name = "vectoradd"
            log_dir = "/logs/vectoradd"
            num_regs = { vecAdd = 16 }
            "#,
        )
        .unwrap();

        assert_eq!(config.shard, ShardSpec::new(1, 3).unwrap());
        assert_eq!(config.seed, Some(99));
        assert_eq!(
            config.targets(),
            vec![(Target::Group(2), 0), (Target::Group(2), 1), (Target::Group(6), 3)]
        );
        let app = &config.apps[0];
        assert_eq!(app.registers("vecAdd").unwrap(), 16);
        assert!(matches!(
            app.registers("other"),
            Err(ConfigError::MissingRegisterCount { .. })
        ));
        assert_eq!(
            app.site_catalog_path(),
            PathBuf::from("/logs/vectoradd/inst-sites.txt")
        );
    }

    #[test]
    fn list_paths() {
        let app = AppConfig::new("a", "/logs/a");

        assert_eq!(
            app.list_path(InjectionMode::InstValue, Target::Group(7), 0, None),
            PathBuf::from("/logs/a/injection-list/modeinst_value-igid7.bfm0.txt")
        );
        assert_eq!(
            app.list_path(InjectionMode::Rf, Target::Rf, 1, Some(100)),
            PathBuf::from("/logs/a/injection-list/moderf-igidrf.bfm1.100.txt")
        );
    }

    #[test]
    fn rejects_bad_shard() {
        let err = Config::from_toml_str("shard = { index = 3, total = 3 }").unwrap_err();
        assert!(err.to_string().contains("out of range"));

        assert!(Config::from_toml_str("shard = { index = 0, total = 0 }").is_err());
    }

    #[test]
    fn rejects_unknown_group() {
        let err = Config::from_toml_str("[[inst_value]]\nigid = 8\nbfms = [0]\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGroup { igid: 8, groups: 8 }));
    }

    #[test]
    fn rejects_duplicate_app() {
        let err = Config::from_toml_str(
            "[[apps]]\nname = \"a\"\nlog_dir = \"x\"\n[[apps]]\nname = \"a\"\nlog_dir = \"y\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateApp(name) if name == "a"));
    }

    #[test]
    fn rejects_per_site_rf() {
        let err = Config::from_toml_str("mode = \"rf\"").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedMode { .. }));

        let config = Config::from_toml_str("mode = \"rf\"\nstrategy = \"random\"").unwrap();
        assert_eq!(config.targets(), vec![(Target::Rf, 0)]);
        assert_eq!(config.total_count_column(), 6);
    }

    #[test]
    fn rejects_unknown_key() {
        assert!(matches!(
            Config::from_toml_str("threads = 3"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn parse_names() {
        assert_eq!("rf".parse::<InjectionMode>().unwrap(), InjectionMode::Rf);
        assert!("value".parse::<InjectionMode>().is_err());
        assert_eq!(
            "per-site".parse::<ListStrategy>().unwrap(),
            ListStrategy::PerSite
        );
        assert_eq!(InjectionMode::InstAddress.to_string(), "inst_address");
    }
}
