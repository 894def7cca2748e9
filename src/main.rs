use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use bevy::app::{AppExit, ScheduleRunnerPlugin};
use bevy::prelude::*;
use clap::{Parser, Subcommand};
use dmsm_core::config;
use dmsm_core::host::{HostPlugin, LoadedLevels};
use dmsm_core::marker_api::{InMemoryMarkerApi, MarkerService};
use dmsm_core::settings::DmsmSettings;
use dmsm_core::DmsmPlugin;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

/// Host ticks at 20 per second
const TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(version, about = "Sign-driven map markers")]
struct Cli {
    /// Marker type config, defaults to $XDG_CONFIG_HOME/dmsm/dmsm.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Also write a debug log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Load the marker type config and report what it defines
    Check,
    /// Run a headless host with an in-memory marker service
    Run {
        /// Seconds between sweeps for dangling markers
        #[arg(long)]
        sweep_interval: Option<u64>,
        #[arg(long)]
        persistent_markers: bool,
        /// Permission namespace
        #[arg(long)]
        namespace: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(&cli) {
        eprintln!("Could not set up logging: {e}");
        return ExitCode::FAILURE;
    }

    let mut settings = DmsmSettings::default();
    if let Some(config_path) = cli.config.clone() {
        settings = settings.with_config_path(config_path);
    }

    match cli.command {
        Action::Check => check(&settings),
        Action::Run {
            sweep_interval,
            persistent_markers,
            namespace,
        } => {
            if let Some(secs) = sweep_interval {
                settings = settings.with_sweep_interval(Duration::from_secs(secs));
            }
            if let Some(namespace) = namespace {
                settings = settings.with_namespace(namespace);
            }
            run(settings.with_persistent_markers(persistent_markers))
        },
    }
}

fn check(settings: &DmsmSettings) -> ExitCode {
    let loaded = config::load_marker_types(settings.config_path());
    println!("{}", settings.config_path().display());
    for definition in loaded.definitions.iter() {
        println!(
            "  [{}] {:?} -> set {} ({}), icon {}, permission {}",
            definition.section(),
            definition.keyword(),
            definition.id(),
            definition.label(),
            definition.icon(),
            settings.permission_for(definition.id())
        );
    }
    for error in loaded.errors.iter() {
        println!("  error: {error}");
    }
    if loaded.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(settings: DmsmSettings) -> ExitCode {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(TICK)),
        HostPlugin,
        DmsmPlugin,
    ))
    .insert_resource(settings)
    .insert_resource(MarkerService::new(InMemoryMarkerApi::with_default_icons()));
    app.world_mut()
        .resource_mut::<LoadedLevels>()
        .insert("world".to_string());
    log::info!("Headless host running, one tick every {TICK:?}");

    match app.run() {
        AppExit::Success => ExitCode::SUCCESS,
        AppExit::Error(code) => ExitCode::from(code.get()),
    }
}

fn setup_logging(cli: &Cli) -> std::io::Result<()> {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(log_file) = cli.log_file.as_ref() {
        loggers.push(WriteLogger::new(
            LevelFilter::Debug,
            ConfigBuilder::new()
                .set_target_level(LevelFilter::Error)
                .build(),
            File::create(log_file)?,
        ));
    }
    CombinedLogger::init(loggers).map_err(std::io::Error::other)
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_options_parse() {
        let cli = Cli::try_parse_from([
            "dmsm",
            "run",
            "--sweep-interval",
            "30",
            "--namespace",
            "maps",
            "--config",
            "/tmp/dmsm.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/dmsm.toml")));
        assert!(matches!(
            cli.command,
            Action::Run {
                sweep_interval: Some(30),
                persistent_markers: false,
                namespace: Some(_),
            }
        ));
    }
}
