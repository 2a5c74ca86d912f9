use std::path::PathBuf;

use clap::Args;
use serde::Deserialize;

use cloudwatch_logs::DEFAULT_REGION;
use log_export::ExportSettings;

use super::error::CliError;

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub mode: Option<String>,
    pub log_group: Option<String>,
    /// Comma separated list or a TOML array.
    pub log_stream: Option<StreamList>,
    pub output_dir: Option<PathBuf>,
    pub channel_capacity: Option<usize>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StreamList {
    Joined(String),
    List(Vec<String>),
}

impl StreamList {
    fn joined(self) -> String {
        match self {
            StreamList::Joined(s) => s,
            StreamList::List(v) => v.join(","),
        }
    }
}

pub fn load_config(path: &str) -> Result<Config, CliError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CliError::ConfigFile(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| CliError::ConfigFile(format!("bad config {path}: {e}")))
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug, Default)]
pub struct ExportArgs {
    /// Path to an optional TOML config file
    #[arg(long, default_value = "cwlogs-export.toml", env = "CWLOGS_EXPORT_CONFIG")]
    pub config: String,

    /// AWS region [default: ap-northeast-1]
    #[arg(long)]
    pub region: Option<String>,

    /// Shared config profile name
    #[arg(long)]
    pub profile: Option<String>,

    /// Start date, YYYY-MM-DD (UTC) [default: 2024-02-01]
    #[arg(short = 's', long)]
    pub start: Option<String>,

    /// End date, YYYY-MM-DD (UTC) [default: 2024-02-02]
    #[arg(short = 'e', long)]
    pub end: Option<String>,

    /// Output mode: stdout or file [default: stdout]
    #[arg(long)]
    pub mode: Option<String>,

    /// Log group name
    #[arg(long)]
    pub log_group: Option<String>,

    /// Log stream names (comma separated)
    #[arg(long)]
    pub log_stream: Option<String>,

    /// Directory for file mode output [default: .]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Records buffered between fetchers and the writer [default: 10]
    #[arg(long)]
    pub channel_capacity: Option<usize>,

    /// Page limit per stream [default: 10000]
    #[arg(long)]
    pub max_pages: Option<usize>,
}

// ═══════════════════════════════════════════════════════════════
//  Effective — merged config
// ═══════════════════════════════════════════════════════════════

/// Final settings after merging: defaults < config file < CLI.
#[derive(Debug)]
pub struct Effective {
    pub region: String,
    pub profile: Option<String>,
    pub settings: ExportSettings,
}

impl Effective {
    pub fn new(args: &ExportArgs) -> Result<Self, CliError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                Config::default()
            }
        };
        Ok(Self::merge(args, cfg))
    }

    fn merge(args: &ExportArgs, cfg: Config) -> Self {
        let defaults = ExportSettings::default();
        Self {
            region: args.region.clone().or(cfg.region).unwrap_or_else(|| DEFAULT_REGION.into()),
            profile: args.profile.clone().or(cfg.profile),
            settings: ExportSettings {
                log_group: args.log_group.clone().or(cfg.log_group).unwrap_or_default(),
                log_streams: args
                    .log_stream
                    .clone()
                    .or(cfg.log_stream.map(StreamList::joined))
                    .unwrap_or_default(),
                start: args.start.clone().or(cfg.start).unwrap_or(defaults.start),
                end: args.end.clone().or(cfg.end).unwrap_or(defaults.end),
                mode: args.mode.clone().or(cfg.mode).unwrap_or(defaults.mode),
                output_dir: args.output_dir.clone().or(cfg.output_dir).unwrap_or(defaults.output_dir),
                channel_capacity: args
                    .channel_capacity
                    .or(cfg.channel_capacity)
                    .unwrap_or(defaults.channel_capacity),
                max_pages: args.max_pages.or(cfg.max_pages).unwrap_or(defaults.max_pages),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ExportArgs,
    }

    fn parse(argv: &[&str]) -> ExportArgs {
        TestCli::try_parse_from(std::iter::once("cwlogs-export").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn defaults_when_nothing_given() {
        let eff = Effective::merge(&ExportArgs::default(), Config::default());
        assert_eq!(eff.region, "ap-northeast-1");
        assert_eq!(eff.profile, None);
        assert_eq!(eff.settings.start, "2024-02-01");
        assert_eq!(eff.settings.end, "2024-02-02");
        assert_eq!(eff.settings.mode, "stdout");
        assert_eq!(eff.settings.output_dir, PathBuf::from("."));
        assert_eq!(eff.settings.channel_capacity, 10);
        assert!(eff.settings.log_group.is_empty());
    }

    #[test]
    fn short_flags_and_long_flags() {
        let args = parse(&[
            "-s", "2024-03-01", "-e", "2024-03-04", "--mode", "file",
            "--log-group", "/ecs/api", "--log-stream", "a,b", "--profile", "dev",
        ]);
        let eff = Effective::merge(&args, Config::default());
        assert_eq!(eff.settings.start, "2024-03-01");
        assert_eq!(eff.settings.end, "2024-03-04");
        assert_eq!(eff.settings.mode, "file");
        assert_eq!(eff.settings.log_group, "/ecs/api");
        assert_eq!(eff.settings.log_streams, "a,b");
        assert_eq!(eff.profile.as_deref(), Some("dev"));
    }

    #[test]
    fn cli_overrides_file() {
        let cfg: Config = toml::from_str(
            r#"
            region = "us-east-1"
            log_group = "/from/file"
            log_stream = ["x", "y"]
            mode = "file"
            "#,
        )
        .unwrap();
        let args = parse(&["--log-group", "/from/cli"]);

        let eff = Effective::merge(&args, cfg);
        assert_eq!(eff.region, "us-east-1");
        assert_eq!(eff.settings.log_group, "/from/cli");
        assert_eq!(eff.settings.log_streams, "x,y");
        assert_eq!(eff.settings.mode, "file");
    }

    #[test]
    fn missing_default_config_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let args = ExportArgs { config: path.to_string_lossy().into_owned(), ..ExportArgs::default() };

        let eff = Effective::new(&args).unwrap();
        assert_eq!(eff.region, "ap-northeast-1");
    }

    #[test]
    fn broken_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "log_group = [").unwrap();
        let args = ExportArgs { config: path.to_string_lossy().into_owned(), ..ExportArgs::default() };

        assert!(matches!(Effective::new(&args), Err(CliError::ConfigFile(_))));
    }

    #[test]
    fn unknown_config_key_is_an_error() {
        let err = toml::from_str::<Config>("log_groups = \"typo\"").unwrap_err();
        assert!(err.to_string().contains("log_groups"));
    }
}
