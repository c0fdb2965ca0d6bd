use super::batch_plan::BatchPlan;
use super::catalog::FileCatalog;
use super::config::Config;
use super::error::ProcessorError;
use super::exceptions::ExceptionTables;
use super::segmentation::split_into_sub_batches;

/// The main routine of orchid_batcher.
///
/// This takes in a config (and progress monitor), reads every raw file in the input
/// directory, and splits the batch into named sub-batches. `progress` receives the
/// fraction of files read so far.
pub fn process(
    config: &Config,
    progress: impl FnMut(f32),
) -> Result<Vec<BatchPlan>, ProcessorError> {
    config.check_input_path()?;
    let tables = ExceptionTables::new(config.exception_table_path.as_deref())?;
    if config.has_exception_table_path() {
        log::info!(
            "Loaded {} setup and {} position entries.",
            tables.n_setups(),
            tables.n_positions()
        );
    } else {
        log::info!("Using the bundled exception tables.");
    }

    let zone = config.clock_zone()?;
    log::info!("Reading buffer end times as {zone:?} wall clock times.");

    log::info!("Getting header info...");
    let catalog = FileCatalog::new(&config.input_path, zone, progress)?;
    if catalog.is_empty() {
        return Err(ProcessorError::NoFilesError);
    }
    log::info!(
        "Read {} files with total size: {}",
        catalog.len(),
        human_bytes::human_bytes(catalog.get_total_data_size() as f64)
    );
    if catalog.n_skipped() > 0 {
        log::warn!("{} files could not be read and were skipped", catalog.n_skipped());
    }

    let sub_batches = split_into_sub_batches(
        catalog.into_records(),
        &tables,
        &config.split_thresholds(),
    )?;
    let plans = BatchPlan::name_sub_batches(config, sub_batches);
    log::info!("Found {} batches in the folder.", plans.len());
    Ok(plans)
}
