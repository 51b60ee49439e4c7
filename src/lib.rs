use std::{
    fmt::Display,
    path::PathBuf,
    str::FromStr,
};

use clap::{Arg, ArgAction, Command};
use log::LevelFilter;

pub mod core;
pub mod engine;
pub mod logging;
pub mod session;

pub use crate::core::{EngineError, FatalRenderError, HarnessError, Mode, Result, Scene};
pub use session::{Harness, HarnessContext, RunOutcome, SessionController, SessionListener};

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Everything the `run` subcommand configures.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub mode: Mode,
    pub scene: Scene,
    pub single_run: bool,
    /// Device-selection string handed to the engine as is. `None` leaves the choice to it.
    pub device_selection: Option<String>,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Benchmark(crate::core::BenchmarkVariant::NoSpectralOclGpu),
            scene: Scene::default(),
            single_run: false,
            device_selection: None,
            log_level: LevelFilter::Info,
            log_file: None,
        }
    }
}

impl Display for HarnessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mode {} | scene {} | single run {} | devices {}",
            self.mode.id(),
            self.scene.id(),
            self.single_run,
            self.device_selection.as_deref().unwrap_or("<engine default>")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    Run(HarnessConfig),
    /// Print the known modes and scenes.
    List,
}

pub fn create_clap_command() -> Command {
    Command::new("render_bench")
        .about("Render benchmark harness")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(
            Command::new("run")
                .about("Run a benchmark, stress test or interactive session (default)")
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .value_name("MODE")
                        .help("Mode identifier, e.g. BENCHMARK_NOSPECTRAL_OCL_GPU or INTERACTIVE (see `list`)")
                        .required(false),
                )
                .arg(
                    Arg::new("scene")
                        .short('s')
                        .long("scene")
                        .value_name("SCENE")
                        .help("Scene identifier: room, sala, luxball-hdr, luxball or luxball-sky")
                        .required(false),
                )
                .arg(
                    Arg::new("single-run")
                        .long("single-run")
                        .help("Print the score and exit once the benchmark completes")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("devices")
                        .short('d')
                        .long("devices")
                        .value_name("SELECTION")
                        .help("Device selection string, one '0' or '1' per device")
                        .required(false),
                )
                .arg(
                    Arg::new("log-level")
                        .long("log-level")
                        .value_name("LEVEL")
                        .default_value("info")
                        .value_parser(LOG_LEVELS),
                )
                .arg(
                    Arg::new("log-file")
                        .long("log-file")
                        .value_name("FILE")
                        .help("Also write the log to this file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .required(false),
                ),
        )
        .subcommand(Command::new("list").about("List the available modes and scenes"))
}

pub fn handle_clap_matches(matches: &clap::ArgMatches) -> Result<CliAction> {
    match matches.subcommand() {
        Some(("list", _)) => Ok(CliAction::List),
        Some(("run", sub_matches)) => {
            let mut config = HarnessConfig::default();
            if let Some(mode) = sub_matches.get_one::<String>("mode") {
                config.mode = Mode::from_str(mode)?;
            }
            if let Some(scene) = sub_matches.get_one::<String>("scene") {
                config.scene = Scene::from_str(scene)?;
            }
            config.single_run = sub_matches.get_flag("single-run");
            config.device_selection = sub_matches.get_one::<String>("devices").cloned();
            config.log_level = sub_matches
                .get_one::<String>("log-level")
                .and_then(|level| LevelFilter::from_str(level).ok())
                .unwrap_or(LevelFilter::Info);
            config.log_file = sub_matches.get_one::<PathBuf>("log-file").cloned();
            Ok(CliAction::Run(config))
        }
        // Default behavior when no subcommand is provided
        _ => Ok(CliAction::Run(HarnessConfig::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BenchmarkVariant, StressVariant};

    fn parse(args: &[&str]) -> Result<CliAction> {
        let matches = create_clap_command().try_get_matches_from(args).unwrap();
        handle_clap_matches(&matches)
    }

    #[test]
    fn no_subcommand_runs_the_default_benchmark() {
        let action = parse(&["render_bench"]).unwrap();
        assert_eq!(action, CliAction::Run(HarnessConfig::default()));
        if let CliAction::Run(config) = action {
            assert_eq!(config.mode, Mode::Benchmark(BenchmarkVariant::NoSpectralOclGpu));
            assert_eq!(config.scene, Scene::LuxBall);
        }
    }

    #[test]
    fn run_flags() {
        let action = parse(&[
            "render_bench",
            "run",
            "--mode",
            "stresstest_spectral_native_bidir",
            "--scene",
            "sala",
            "--single-run",
            "--devices",
            "0101",
            "--log-level",
            "debug",
            "--log-file",
            "bench.log",
        ])
        .unwrap();
        let CliAction::Run(config) = action else {
            panic!("expected run");
        };
        assert_eq!(
            config.mode,
            Mode::StressTest(StressVariant::SpectralNativeBidir)
        );
        assert_eq!(config.scene, Scene::Sala);
        assert!(config.single_run);
        assert_eq!(config.device_selection.as_deref(), Some("0101"));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.log_file, Some(PathBuf::from("bench.log")));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            parse(&["render_bench", "run", "--mode", "turbo"]),
            Err(HarnessError::InvalidMode { .. })
        ));
        assert!(matches!(
            parse(&["render_bench", "run", "--scene", "kitchen"]),
            Err(HarnessError::InvalidScene { .. })
        ));
    }

    #[test]
    fn bad_log_level_is_a_usage_error() {
        assert!(create_clap_command()
            .try_get_matches_from(["render_bench", "run", "--log-level", "loud"])
            .is_err());
    }

    #[test]
    fn list_subcommand() {
        assert_eq!(parse(&["render_bench", "list"]).unwrap(), CliAction::List);
    }
}
