use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::bench::{LanguageSpec, ProcessRunner, TestCase, TestExecutor};
use crate::template::TemplateError;
use crate::toolchain::Toolchain;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("bench.repetitions must be at least 1")]
    ZeroRepetitions,

    #[error("bench.timeout_secs must be a positive number (got {0})")]
    InvalidTimeout(f64),

    #[error("bench.jobs must be at least 1")]
    ZeroJobs,

    #[error("No test case is configured")]
    NoTests,

    #[error("Language '{0}' is declared more than once")]
    DuplicateLanguage(String),

    #[error("Invalid {field} command of language '{lang}': {source}")]
    InvalidCommand {
        lang: String,
        field: &'static str,
        #[source]
        source: TemplateError,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    #[serde(default)]
    pub bench: BenchConfig,
    #[serde(rename = "test", default = "default_tests")]
    pub tests: Vec<TestCaseConfig>,
    #[serde(rename = "language", default)]
    pub languages: Vec<LanguageConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub shell: PathBuf,
    /// Relative paths are resolved against the config file's directory.
    pub workdir: PathBuf,
    pub repetitions: usize,
    pub timeout_secs: f64,
    pub jobs: usize,
    pub stderr_capture_max_bytes: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/bin/sh"),
            workdir: PathBuf::from("."),
            repetitions: TestExecutor::DEFAULT_REPETITIONS,
            timeout_secs: ProcessRunner::DEFAULT_TIMEOUT.as_secs_f64(),
            jobs: 1,
            stderr_capture_max_bytes: 4096,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TestCaseConfig {
    pub discs: u32,
    pub pegs: u32,
    pub iterations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    #[serde(default)]
    pub order: i64,
    pub program: Option<String>,
    pub version: Option<String>,
    pub compile: Option<String>,
    pub run: String,
    #[serde(default)]
    pub clean: Vec<String>,
}

fn default_tests() -> Vec<TestCaseConfig> {
    [
        (15, 6, 100_000),
        (20, 6, 10_000_000),
        (25, 6, 100_000_000),
        (30, 6, 1_000_000_000),
        (32, 6, 4_294_967_295),
    ]
    .into_iter()
    .map(|(discs, pegs, iterations)| TestCaseConfig {
        discs,
        pegs,
        iterations,
    })
    .collect()
}

/// `None` unless `secs` is a positive number of seconds representable as a [`Duration`].
pub fn positive_secs(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "langbench.toml";

    pub fn example_toml() -> String {
        let file = Asset::get(Self::FILENAME).unwrap();
        std::str::from_utf8(file.data.as_ref()).unwrap().to_owned()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
            .with_context(|| {
                format!(
                    "Cannot find '{}' in the current dir or its ancestors (try `langbench init`)",
                    Self::FILENAME
                )
            })
    }

    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_filepath = Config::find_file_in_ancestors(cur_dir)?;
        Self::from_toml_file(config_filepath)
    }

    /// Everything that can be checked without touching the system.
    pub fn validate(&self) -> StdResult<(), ConfigError> {
        let b = &self.bench;
        if b.repetitions == 0 {
            return Err(ConfigError::ZeroRepetitions);
        }
        b.timeout()?;
        if b.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        if self.tests.is_empty() {
            return Err(ConfigError::NoTests);
        }

        let mut seen = HashSet::new();
        for lang in &self.languages {
            if !seen.insert(lang.name.as_str()) {
                return Err(ConfigError::DuplicateLanguage(lang.name.clone()));
            }
            lang.build(Toolchain::NotRequired)?;
        }
        Ok(())
    }

    pub fn test_cases(&self) -> Vec<TestCase> {
        self.tests
            .iter()
            .enumerate()
            .map(|(i, t)| TestCase::new(i, t.discs, t.pegs, t.iterations))
            .collect()
    }

    /// Directory every benchmark command runs in.
    pub fn workdir(&self) -> PathBuf {
        let dir = &self.bench.workdir;
        match self.source_config_file.as_deref().and_then(Path::parent) {
            Some(base) if dir.is_relative() => fsutil::normalize_path(base.join(dir)),
            _ => dir.to_owned(),
        }
    }

    pub fn process_runner(&self) -> StdResult<ProcessRunner, ConfigError> {
        Ok(ProcessRunner::new()
            .shell(&self.bench.shell)
            .workdir(self.workdir())
            .timeout(self.bench.timeout()?)
            .stderr_capture_max_bytes(self.bench.stderr_capture_max_bytes))
    }
}

impl BenchConfig {
    pub fn timeout(&self) -> StdResult<Duration, ConfigError> {
        self::positive_secs(self.timeout_secs).ok_or(ConfigError::InvalidTimeout(self.timeout_secs))
    }
}

impl LanguageConfig {
    /// Locate the toolchain and build the language descriptor. The lookup
    /// result is final for the whole run.
    pub fn resolve(&self) -> StdResult<LanguageSpec, ConfigError> {
        self.build(Toolchain::locate(self.program.as_deref()))
    }

    pub fn build(&self, toolchain: Toolchain) -> StdResult<LanguageSpec, ConfigError> {
        let invalid = |field| {
            let lang = self.name.clone();
            move |source| ConfigError::InvalidCommand {
                lang,
                field,
                source,
            }
        };

        let mut spec = LanguageSpec::new(&self.name, &self.run)
            .map_err(invalid("run"))?
            .order(self.order)
            .toolchain(toolchain)
            .clean(&self.clean);
        if let Some(cmd) = &self.compile {
            spec = spec.compile(cmd).map_err(invalid("compile"))?;
        }
        if let Some(cmd) = &self.version {
            spec = spec.version(cmd).map_err(invalid("version"))?;
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn example_toml_should_be_parsable() {
        let toml = Config::example_toml();
        let cfg = dbg!(Config::from_toml(&toml)).unwrap();
        cfg.validate().unwrap();

        assert_eq!(cfg.source_config_file, None);
        assert_eq!(cfg.bench, BenchConfig::default());
        assert_eq!(cfg.tests, default_tests());
        assert_eq!(cfg.languages.len(), 7);
        assert_eq!(
            cfg.languages[0],
            LanguageConfig {
                name: "C".to_owned(),
                order: 1,
                program: Some("gcc".to_owned()),
                version: Some("#{program} --version".to_owned()),
                compile: Some("#{program} -O2 -Wall sources/c_test.c -o c_test".to_owned()),
                run: "./c_test #{test} #{args}".to_owned(),
                clean: vec!["c_test".to_owned()],
            }
        );
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let cfg = Config::from_toml(
            r#"
            [[language]]
            name = "Sh"
            run = "sh sources/sh_test.sh #{test} #{args}"
            "#,
        )
        .unwrap();
        cfg.validate().unwrap();

        assert_eq!(cfg.bench.repetitions, 5);
        assert_eq!(cfg.bench.timeout(), Ok(Duration::from_secs(1)));
        assert_eq!(cfg.bench.jobs, 1);

        let cases = cfg.test_cases();
        assert_eq!(cases.len(), 5);
        assert_eq!(cases[4], TestCase::new(4, 32, 6, 4294967295));

        let lang = &cfg.languages[0];
        assert_eq!(lang.order, 0);
        assert_eq!(lang.program, None);
        assert!(lang.clean.is_empty());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let base = "[[test]]\ndiscs = 3\npegs = 3\niterations = 10\n";
        let check = |extra: &str| {
            Config::from_toml(&format!("{}{}", extra, base))
                .unwrap()
                .validate()
        };

        assert_eq!(check("[bench]\nrepetitions = 0\n"), Err(ConfigError::ZeroRepetitions));
        assert_eq!(check("[bench]\njobs = 0\n"), Err(ConfigError::ZeroJobs));
        assert_eq!(
            check("[bench]\ntimeout_secs = 0.0\n"),
            Err(ConfigError::InvalidTimeout(0.0))
        );
        assert!(matches!(
            check("[bench]\ntimeout_secs = nan\n"),
            Err(ConfigError::InvalidTimeout(_))
        ));

        let cfg = Config::from_toml("test = []").unwrap();
        assert_eq!(cfg.validate(), Err(ConfigError::NoTests));
    }

    #[test]
    fn out_of_range_timeout_is_an_error_not_a_panic() {
        for secs in ["1e30", "-1.0", "inf", "1e-12"] {
            let cfg = Config::from_toml(&format!("[bench]\ntimeout_secs = {}\n", secs)).unwrap();
            assert!(
                matches!(cfg.validate(), Err(ConfigError::InvalidTimeout(_))),
                "{}",
                secs
            );
            assert!(cfg.process_runner().is_err(), "{}", secs);
        }

        let cfg = Config::from_toml("[bench]\ntimeout_secs = 2.5\n").unwrap();
        assert_eq!(
            cfg.process_runner().unwrap().get_timeout(),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn positive_secs_bounds() {
        assert_eq!(positive_secs(0.5), Some(Duration::from_millis(500)));
        assert_eq!(positive_secs(0.0), None);
        assert_eq!(positive_secs(f64::NAN), None);
        assert_eq!(positive_secs(1e30), None);
    }

    #[test]
    fn validation_rejects_duplicates_and_broken_templates() {
        let cfg = Config::from_toml(
            r#"
            [[language]]
            name = "A"
            run = "a"
            [[language]]
            name = "A"
            run = "b"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateLanguage("A".to_owned()))
        );

        let cfg = Config::from_toml(
            r#"
            [[language]]
            name = "B"
            compile = "cc #{test}.c"
            run = "./b"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidCommand {
                lang: "B".to_owned(),
                field: "compile",
                source: TemplateError::UndefinedVar("test".to_owned(), 5),
            })
        );

        let cfg = Config::from_toml(
            r#"
            [[language]]
            name = "C"
            run = "./c #{args"
            "#,
        )
        .unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidCommand { field: "run", .. })
        ));
    }

    #[test]
    fn workdir_is_relative_to_config_file() {
        let mut cfg = Config::from_toml("[bench]\nworkdir = \"../bench\"\n").unwrap();
        assert_eq!(cfg.workdir(), Path::new("../bench"));

        cfg.source_config_file = Some(PathBuf::from("/home/u/proj/langbench.toml"));
        assert_eq!(cfg.workdir(), Path::new("/home/u/bench"));

        cfg.bench.workdir = PathBuf::from("/tmp/abs");
        assert_eq!(cfg.workdir(), Path::new("/tmp/abs"));
    }

    #[test]
    fn resolve_builds_language_spec() {
        let lang = LanguageConfig {
            name: "Missing".to_owned(),
            order: 3,
            program: Some("surely-not-an-installed-compiler-xyz".to_owned()),
            version: None,
            compile: Some("#{program} main.x".to_owned()),
            run: "./main #{args}".to_owned(),
            clean: vec!["main".to_owned()],
        };
        let spec = lang.resolve().unwrap();
        assert_eq!(spec.name(), "Missing");
        assert_eq!(spec.get_order(), 3);
        assert!(!spec.is_available());
        assert_eq!(spec.get_clean(), ["main"]);
        assert!(spec.is_compile_cmd_defined());
    }
}
