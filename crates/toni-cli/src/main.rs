// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod prefs;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use prefs::PrefsFile;
use runtime::WorkerRuntime;
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use time::OffsetDateTime;
use toni_app::{AppState, Settings};
use toni_db::Store;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEMO_SEED: u64 = 42;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // the local offset can only be read safely before any thread starts
    let today = OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date();

    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `toni --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        match &options.db_path {
            Some(path) => path.clone(),
            None => config.db_path()?,
        }
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let log_path = init_tracing(&config)?;
    info!(config = %options.config_path.display(), log = %log_path.display(), "starting toni");

    let store = if options.demo {
        Store::open_memory()?
    } else {
        Store::open(&db_path).with_context(|| {
            format!(
                "open database {} -- if this path is wrong, set [storage].db_path or TONI_DB_PATH",
                db_path.display()
            )
        })?
    };
    store.bootstrap()?;
    if options.demo {
        let counts = toni_testkit::seed_demo(&store, DEMO_SEED).context("seed demo data")?;
        info!(
            restaurants = counts.restaurants,
            visits = counts.visits,
            wishlist = counts.wishlist,
            "seeded demo data"
        );
    }

    let places = build_places_client(&config).with_context(|| {
        format!(
            "invalid [places] config in {}; fix base_url/location/timeout values",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        return Ok(());
    }

    let mut settings = Settings::new(today);
    settings.suggestions_enabled = places.is_some();
    settings.half_page = config.half_page();
    settings.debounce = config.search_debounce()?;

    let prefs_file = PrefsFile::beside(&options.config_path);
    let mut state = AppState::new(settings, prefs_file.load());
    let mut runtime = WorkerRuntime::start(store, places, prefs_file)?;

    let result = toni_tui::run_app(&mut state, &mut runtime);
    let stopped = runtime.shutdown();
    result?;
    stopped?;
    info!("toni exited");
    Ok(())
}

fn build_places_client(config: &Config) -> Result<Option<toni_places::Client>> {
    if !config.places_enabled() {
        info!("places suggestions disabled in config");
        return Ok(None);
    }
    let Some(api_key) = config.places_api_key() else {
        info!("no places api key; suggestions disabled");
        return Ok(None);
    };
    let client = toni_places::Client::new(
        config.places_base_url(),
        &api_key,
        config.places_location(),
        config.places_timeout()?,
    )?;
    Ok(Some(client))
}

/// Logs go to a file because the terminal belongs to the TUI.
fn init_tracing(config: &Config) -> Result<PathBuf> {
    let path = config.log_file()?;
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {} -- set [log].file to a writable path", path.display()))?;

    let filter = EnvFilter::try_from_env("TONI_LOG")
        .or_else(|_| EnvFilter::try_new(config.log_level()))
        .with_context(|| {
            format!(
                "invalid log level {:?}; use an EnvFilter directive such as \"info\" or \"toni_app=debug\"",
                config.log_level()
            )
        })?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .context("install log subscriber")?;
    Ok(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    db_path: Option<PathBuf>,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        db_path: None,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let flag = arg.as_ref();
        match flag {
            "--config" | "--db" => {
                let value = args.next().ok_or_else(|| match flag {
                    "--config" => anyhow!("--config requires a file path"),
                    _ => anyhow!("--db requires a database path"),
                })?;
                let value = value.as_ref();
                if flag == "--db" {
                    toni_db::validate_db_path(value)?;
                    options.db_path = Some(PathBuf::from(value));
                } else {
                    options.config_path = PathBuf::from(value);
                }
            }
            "--print-config-path" => options.print_config_path = true,
            "--print-path" => options.print_db_path = true,
            "--print-example-config" => options.print_example = true,
            "--demo" => options.demo = true,
            "--check" => options.check_only = true,
            "--help" | "-h" => options.show_help = true,
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("toni -- restaurant visits, restaurants and a wishlist");
    println!("  --config <path>          Use a specific config path");
    println!("  --db <path>              Use a specific database file");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --check                  Validate config + DB + places client, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        parse_cli_args(args.iter().copied(), PathBuf::from("/tmp/toni-config.toml"))
    }

    #[test]
    fn no_arguments_keep_the_default_config_path() -> Result<()> {
        let options = parse(&[])?;
        assert_eq!(
            options,
            CliOptions {
                config_path: PathBuf::from("/tmp/toni-config.toml"),
                db_path: None,
                print_config_path: false,
                print_db_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn config_and_db_take_a_value() -> Result<()> {
        let options = parse(&["--config", "/custom/config.toml", "--db", "/data/toni.db"])?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.db_path, Some(PathBuf::from("/data/toni.db")));
        Ok(())
    }

    #[test]
    fn flags_without_values_are_rejected() {
        let error = parse(&["--config"]).expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse(&["--demo", "--db"]).expect_err("missing db value should fail");
        assert!(error.to_string().contains("--db requires a database path"));
    }

    #[test]
    fn uri_database_paths_are_rejected_up_front() {
        let error = parse(&["--db", "file:toni.db?mode=ro"]).expect_err("URI db path should fail");
        assert!(error.to_string().contains("file: URI"));
    }

    #[test]
    fn unknown_arguments_point_at_help() {
        let error = parse(&["--wat"]).expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument \"--wat\""));
        assert!(message.contains("--help"));
    }

    #[test]
    fn boolean_flags_combine() -> Result<()> {
        let options = parse(&["--print-example-config", "--check", "--demo", "--print-path"])?;
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.demo);
        assert!(options.print_db_path);
        assert!(!options.print_config_path);
        assert!(!options.show_help);

        assert!(parse(&["--print-config-path"])?.print_config_path);
        Ok(())
    }

    #[test]
    fn help_has_a_short_form() -> Result<()> {
        assert!(parse(&["--help"])?.show_help);
        assert!(parse(&["-h"])?.show_help);
        Ok(())
    }
}
