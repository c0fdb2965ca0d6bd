use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::path::{Path, PathBuf};

use liborchid_batcher::config::Config;
use liborchid_batcher::process::process;

fn make_template_config(path: &Path) {
    let config = Config::default();
    config
        .write_config_file(path)
        .expect("Failed to write template config file!");
}

fn main() {
    // Create a cli
    let matches = Command::new("orchid_batcher_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("Batch input directory; overrides the configuration"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Base output directory; overrides the configuration"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    let config_path = matches.get_one::<String>("path").map(PathBuf::from);

    if let Some(("new", _)) = matches.subcommand() {
        let Some(config_path) = config_path else {
            log::error!("A path is required to make a template config");
            return;
        };
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        make_template_config(&config_path);
        log::info!("Done.");
        return;
    }

    // Load our config
    let mut config = match config_path {
        Some(path) => {
            log::info!("Loading config from {}...", path.to_string_lossy());
            match Config::read_config_file(&path) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("{e}");
                    return;
                }
            }
        }
        None => Config::default(),
    };
    if let Some(input) = matches.get_one::<String>("input") {
        config.input_path = PathBuf::from(input);
    }
    if let Some(output) = matches.get_one::<String>("output") {
        config.output_path = PathBuf::from(output);
    }
    log::info!("Config successfully loaded.");
    log::info!("Input Directory: {}", config.input_path.to_string_lossy());
    log::info!("Base Output Directory: {}", config.output_path.to_string_lossy());
    match &config.exception_table_path {
        Some(p) => log::info!("Exception Tables: {}", p.to_string_lossy()),
        None => log::info!("Exception Tables: bundled defaults"),
    }
    log::info!("Split Time Threshold: {} s", config.split_time_threshold);
    match config.utc_offset_seconds {
        Some(s) => log::info!("DAQ Clock UTC Offset: {s} s"),
        None => log::info!("DAQ Clock UTC Offset: local time"),
    }

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    let result = process(&config, |fraction| pb.set_position((fraction * 100.0) as u64));
    pb.finish();

    match result {
        Ok(plans) => {
            for plan in plans.iter() {
                log::info!("\n{plan}");
            }
            log::info!("Created {} sub-batches from {}", plans.len(), config.batch_name());
        }
        Err(e) => log::error!("Batching failed with error: {e}"),
    }

    log::info!("Done.");
}
