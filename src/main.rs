use std::{path::PathBuf, str::FromStr};

use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{LevelFilter, error, info, warn};

use pitwall::{
    AppConfig, FileBasedCache, PitwallError, RaceTraceReference, SessionKind, SessionProvider,
    analysis::{
        LapTimeFilter, TelemetryChannel, get_track_status_by_lap, get_weather_data_by_lap,
        tyre_stints,
    },
    plotting::{
        Figure, plot_lap_times, plot_race_trace, plot_rainfall_highlights,
        plot_telemetry_comparison, plot_tyre_strategy, write_svg,
    },
    report, ui,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
struct SessionArgs {
    #[arg(short, long)]
    year: u16,

    /// Event name or location, partial names are accepted
    #[arg(short, long)]
    event: String,

    /// FP1, FP2, FP3, SQ, S, Q or R
    #[arg(short, long, default_value = "R")]
    session: SessionKind,

    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
struct FigureArgs {
    /// Write the figure to an SVG file instead of opening the viewer
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the current configuration
    Show,
    /// Update and save configuration values
    Set {
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        #[arg(long)]
        figure_width: Option<u32>,
        #[arg(long)]
        figure_height: Option<u32>,
        #[arg(long)]
        rainfall_threshold_mm: Option<f32>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy a session file into the cache
    Import {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// List cached sessions
    Sessions {
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Track status of the race leader for every lap
    TrackStatus {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Weather sample closest to each leader lap
    Weather {
        #[command(flatten)]
        session: SessionArgs,
    },
    RaceTrace {
        #[command(flatten)]
        session: SessionArgs,

        /// "average", "leader" or a driver abbreviation
        #[arg(short, long, default_value = "average")]
        reference: RaceTraceReference,

        #[arg(short, long, value_delimiter = ',')]
        drivers: Option<Vec<String>>,

        #[command(flatten)]
        figure: FigureArgs,
    },
    LapTimes {
        #[command(flatten)]
        session: SessionArgs,

        #[arg(short, long, value_delimiter = ',')]
        drivers: Option<Vec<String>>,

        #[arg(long)]
        keep_pit_laps: bool,

        #[arg(long)]
        keep_safety_car_laps: bool,

        #[arg(long)]
        keep_first_lap: bool,

        #[command(flatten)]
        figure: FigureArgs,
    },
    TyreStrategy {
        #[command(flatten)]
        session: SessionArgs,

        #[arg(short, long, value_delimiter = ',')]
        drivers: Option<Vec<String>>,

        /// Print the stints as a table instead of plotting them
        #[arg(long)]
        table: bool,

        #[command(flatten)]
        figure: FigureArgs,
    },
    /// Compare the telemetry of two laps, e.g. --reference VER:12 --compare HAM:12
    Compare {
        #[command(flatten)]
        session: SessionArgs,

        #[arg(short, long)]
        reference: LapSelector,

        #[arg(short, long)]
        compare: LapSelector,

        #[arg(short, long, value_delimiter = ',', default_value = "speed,delta")]
        plots: Vec<TelemetryChannel>,

        #[command(flatten)]
        figure: FigureArgs,
    },
}

/// A driver lap written as `DRIVER:LAP`
#[derive(Debug, Clone, PartialEq)]
struct LapSelector {
    driver: String,
    lap_number: u32,
}

impl FromStr for LapSelector {
    type Err = PitwallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PitwallError::InvalidUserInput {
            field: "lap".to_string(),
            reason: format!("'{}' {}", s, reason),
        };
        let (driver, lap) = s
            .split_once(':')
            .ok_or_else(|| invalid("must be written as DRIVER:LAP"))?;
        let driver = driver.trim().to_uppercase();
        if driver.is_empty() {
            return Err(invalid("has no driver"));
        }
        let lap_number = lap
            .trim()
            .parse::<u32>()
            .map_err(|_| invalid("has an invalid lap number"))?;
        Ok(Self { driver, lap_number })
    }
}

fn load_config() -> AppConfig {
    match AppConfig::from_local_file() {
        Ok(Some(config)) => config,
        Ok(None) => AppConfig::default(),
        Err(e) => {
            warn!("Could not read config file, using defaults: {}", e);
            AppConfig::default()
        }
    }
}

fn open_cache(
    cache_dir: Option<&PathBuf>,
    config: &AppConfig,
) -> Result<FileBasedCache, PitwallError> {
    match cache_dir.or(config.cache_dir.as_ref()) {
        Some(path) => FileBasedCache::new(path.clone()),
        None => FileBasedCache::new_default(),
    }
}

fn load_session(
    args: &SessionArgs,
    config: &AppConfig,
) -> Result<pitwall::Session, PitwallError> {
    let mut cache = open_cache(args.cache_dir.as_ref(), config)?;
    let session = cache.get_session(args.year, &args.event, args.session)?;
    info!(
        "Loaded {} {} {}: {} drivers, {} laps",
        session.info.year,
        session.info.event_name,
        session.info.session_kind,
        session.drivers.len(),
        session.laps.len()
    );
    Ok(session)
}

fn figure_size(args: &FigureArgs, config: &AppConfig) -> (u32, u32) {
    let (width, height) = config.figure_size();
    (args.width.unwrap_or(width), args.height.unwrap_or(height))
}

/// Saves the figure when an output path was given, otherwise opens the viewer
fn present(figure: Figure, args: &FigureArgs, config: &AppConfig) -> Result<(), PitwallError> {
    match &args.output {
        Some(output) => {
            let path = match &config.output_dir {
                Some(dir) if output.is_relative() => dir.join(output),
                _ => output.clone(),
            };
            write_svg(&path, &figure)
        }
        None => ui::show_figure(figure),
    }
}

fn configure(command: &ConfigCommands, mut config: AppConfig) -> Result<(), PitwallError> {
    match command {
        ConfigCommands::Show => {
            let text = serde_json::to_string_pretty(&config)
                .map_err(|e| PitwallError::ConfigSerializeError { source: e })?;
            println!("{}", text);
            println!("# {}", AppConfig::config_path()?.display());
        }
        ConfigCommands::Set {
            cache_dir,
            figure_width,
            figure_height,
            rainfall_threshold_mm,
            output_dir,
        } => {
            if let Some(cache_dir) = cache_dir {
                config.cache_dir = Some(cache_dir.clone());
            }
            if let Some(width) = figure_width {
                config.figure_width = *width;
            }
            if let Some(height) = figure_height {
                config.figure_height = *height;
            }
            if let Some(threshold) = rainfall_threshold_mm {
                config.rainfall_threshold_mm = *threshold;
            }
            if let Some(output_dir) = output_dir {
                config.output_dir = Some(output_dir.clone());
            }
            config.save()?;
            info!("Configuration saved to {}", AppConfig::config_path()?.display());
        }
    }
    Ok(())
}

fn run(command: &Commands, config: AppConfig) -> Result<(), PitwallError> {
    match command {
        Commands::Import { input, cache_dir } => {
            let mut cache = open_cache(cache_dir.as_ref(), &config)?;
            let info = cache.import_file(input)?;
            info!(
                "Imported {} {} {} into {}",
                info.year,
                info.event_name,
                info.session_kind,
                cache.cache_path().display()
            );
        }
        Commands::Sessions { cache_dir } => {
            let cache = open_cache(cache_dir.as_ref(), &config)?;
            let sessions = cache.list_sessions()?;
            if sessions.is_empty() {
                warn!("No sessions in {}", cache.cache_path().display());
            } else {
                println!("{}", report::sessions_table(&sessions));
            }
        }
        Commands::Config { command } => configure(command, config)?,
        Commands::TrackStatus { session } => {
            let session = load_session(session, &config)?;
            println!(
                "{}",
                report::track_status_table(&get_track_status_by_lap(&session))
            );
        }
        Commands::Weather { session } => {
            let session = load_session(session, &config)?;
            println!(
                "{}",
                report::weather_table(&get_weather_data_by_lap(&session))
            );
        }
        Commands::RaceTrace {
            session,
            reference,
            drivers,
            figure,
        } => {
            let session = load_session(session, &config)?;
            let mut plot = plot_race_trace(
                &session,
                reference,
                drivers.as_deref(),
                figure_size(figure, &config),
            )?;
            if let Some(axes) = plot.axes.first_mut() {
                plot_rainfall_highlights(axes, &session, config.rainfall_threshold_mm);
            }
            present(plot, figure, &config)?;
        }
        Commands::LapTimes {
            session,
            drivers,
            keep_pit_laps,
            keep_safety_car_laps,
            keep_first_lap,
            figure,
        } => {
            let session = load_session(session, &config)?;
            let filter = LapTimeFilter {
                ignore_pit_laps: !keep_pit_laps,
                ignore_safety_car_laps: !keep_safety_car_laps,
                ignore_first_lap: !keep_first_lap,
            };
            let mut plot = plot_lap_times(
                &session,
                drivers.as_deref(),
                filter,
                figure_size(figure, &config),
            );
            if let Some(axes) = plot.axes.first_mut() {
                plot_rainfall_highlights(axes, &session, config.rainfall_threshold_mm);
            }
            present(plot, figure, &config)?;
        }
        Commands::TyreStrategy {
            session,
            drivers,
            table,
            figure,
        } => {
            let session = load_session(session, &config)?;
            if *table {
                println!(
                    "{}",
                    report::stints_table(&tyre_stints(&session, drivers.as_deref()))
                );
            } else {
                let plot =
                    plot_tyre_strategy(&session, drivers.as_deref(), figure_size(figure, &config));
                present(plot, figure, &config)?;
            }
        }
        Commands::Compare {
            session,
            reference,
            compare,
            plots,
            figure,
        } => {
            let session = load_session(session, &config)?;
            let (width, _) = figure_size(figure, &config);
            let plot = plot_telemetry_comparison(
                &session,
                (&reference.driver, reference.lap_number),
                (&compare.driver, compare.lap_number),
                plots,
                width,
            )?;
            present(plot, figure, &config)?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Args::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    colog::default_builder().filter_level(level).init();

    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    let config = load_config();
    if let Err(e) = run(&cli.command, config) {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lap_selector_parsing() {
        assert_eq!(
            "ver:12".parse::<LapSelector>().unwrap(),
            LapSelector {
                driver: "VER".to_string(),
                lap_number: 12
            }
        );
        assert!("VER".parse::<LapSelector>().is_err());
        assert!(":12".parse::<LapSelector>().is_err());
        assert!("VER:first".parse::<LapSelector>().is_err());
    }

    #[test]
    fn test_cli_parses_compare_command() {
        let args = Args::try_parse_from([
            "pitwall",
            "compare",
            "--year",
            "2023",
            "--event",
            "monza",
            "--session",
            "Q",
            "--reference",
            "VER:12",
            "--compare",
            "LEC:12",
            "--plots",
            "speed,throttle",
        ])
        .unwrap();
        match args.command {
            Commands::Compare {
                session, plots, ..
            } => {
                assert_eq!(session.year, 2023);
                assert_eq!(session.session, SessionKind::Qualifying);
                assert_eq!(plots, vec![TelemetryChannel::Speed, TelemetryChannel::Throttle]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from([
            "pitwall", "race-trace", "--year", "2023", "--event", "Italian",
        ])
        .unwrap();
        match args.command {
            Commands::RaceTrace {
                session,
                reference,
                drivers,
                figure,
            } => {
                assert_eq!(session.session, SessionKind::Race);
                assert_eq!(reference, RaceTraceReference::Average);
                assert!(drivers.is_none());
                assert!(figure.output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_figure_size_overrides_config() {
        let config = AppConfig::default();
        let args = FigureArgs {
            output: None,
            width: Some(800),
            height: None,
        };
        assert_eq!(figure_size(&args, &config), (800, config.figure_height));
    }
}
