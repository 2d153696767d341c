use anyhow::Result;
use log::{error, info};
use std::process::ExitCode;

mod config;
mod csv_reader;
mod csv_writer;
mod errors;
mod locator;
mod logging;
mod models;
mod naming;
mod processor;
mod reconciler;
mod traits;

const LOG_TARGET: &str = "swap_recon";

fn main() -> Result<ExitCode> {
    let settings = config::Settings::load()?;
    let paths = settings.paths();
    let log_path = logging::init(settings.log(), paths.log_dir())?;

    info!(
        "paths resolved: INPUT_DIR={} | OUTPUT_DIR={} | LOG_DIR={}",
        paths.input_dir().display(),
        paths.output_dir().display(),
        paths.log_dir().display()
    );
    info!(
        "logging to {} | LEVEL={} | MAX_BYTES={} | BACKUP_COUNT={}",
        log_path.display(),
        settings.log().level(),
        settings.log().max_bytes(),
        settings.log().backup_count()
    );

    let sink = logging::FacadeSink::new(LOG_TARGET);
    let writer = csv_writer::Latin1FileWriter::new(paths.output_dir());
    let mut engine =
        processor::Engine::new(writer, reconciler::SignRules::new(), &sink, paths.input_dir());

    let code = match engine.process() {
        Some(result) => {
            info!(
                "swap cash flows reconciled: output={} business_date={}",
                result.output_filename(),
                result.business_date()
            );
            ExitCode::SUCCESS
        }
        None => {
            error!("swap cash-flow file could not be reconciled, no output written");
            ExitCode::FAILURE
        }
    };

    info!("----- END OF RUN -----");
    Ok(code)
}
