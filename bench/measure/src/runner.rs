//! 程序运行函数.

use crate::result::MeasureReport;
use std::error::Error;
use stream_gauge::prelude::*;
use utils::loader;

/// 实际运行.
pub fn run(prefix: &str, extension: &str) -> Result<MeasureReport, Box<dyn Error>> {
    let dir = loader::image_dir_from_env_or_home()?;
    if !dir.is_dir() {
        return Err(format!("'{}' is not a directory", dir.display()).into());
    }
    let calib = loader::calibration_from_env()?;
    let spec = loader::pipeline_spec_from_env()?;

    let paths = loader::image_paths(&dir, prefix, extension)?;
    log::info!(
        "runner | {} image(s) under {}, {} um/px, seed {}",
        paths.len(),
        dir.display(),
        calib.um_per_pixel(),
        spec.cluster.seed
    );
    let sources: Vec<_> = paths.iter().map(loader::source_for).collect();

    let driver = BatchDriver::new(&calib)
        .with_spec(spec)
        .with_observer(&LogObserver);
    let cpus = utils::cpus();
    let result = if cpus > 1 && sources.len() > 1 {
        log::debug!("runner | parallel over {cpus} core(s)");
        driver.run_par(&sources)?
    } else {
        driver.run(&sources)?
    };

    Ok(MeasureReport::new(dir, paths, result))
}
