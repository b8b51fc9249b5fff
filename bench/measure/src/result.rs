//! 测量结果.

use std::io::{self, Write};
use std::path::PathBuf;
use stream_gauge::prelude::*;

/// 表格列名.
const COLUMNS: [&str; 2] = ["mean_width_um", "std_width_um"];

/// 将整个批次的汇总写进 `w` 中.
fn describe_into<W: Write>(r: &MeasureReport, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    let means: Vec<f64> = r.result.measurements().map(|m| m.mean_width_um).collect();
    let avg = (!means.is_empty()).then(|| means.iter().sum::<f64>() / means.len() as f64);
    let lo = means.iter().copied().reduce(f64::min);
    let hi = means.iter().copied().reduce(f64::max);

    writeln!(w, "Directory `{}`:", r.dir.display())?;
    writeln!(w, "{S4}Images: {}", r.paths.len())?;
    writeln!(w, "{S4}Measured: {}", r.result.len())?;
    writeln!(w, "{S4}Skipped: {}", r.result.skipped().len())?;
    for &i in r.result.skipped() {
        writeln!(w, "{S4}{S4}#{i} {}", r.paths[i].display())?;
    }
    writeln!(w, "{S4}Average mean width: {} um", f64_to_display(avg))?;
    write!(
        w,
        "{S4}Mean width range: [{}, {}] um",
        f64_to_display(lo),
        f64_to_display(hi)
    )?;
    Ok(())
}

/// 一次批量测量的结果.
pub struct MeasureReport {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    result: BatchResult,
}

impl MeasureReport {
    pub fn new(dir: PathBuf, paths: Vec<PathBuf>, result: BatchResult) -> Self {
        Self { dir, paths, result }
    }

    /// 输出汇总与逐张图像的结果表.
    pub fn analyze(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        utils::sep_to(&mut out)?;
        describe_into(self, &mut out)?;
        writeln!(out)?;
        utils::sep_to(&mut out)?;

        match self.result.to_table(&COLUMNS) {
            Ok(table) => writeln!(out, "{table}")?,
            Err(e) => log::error!("{e}"),
        }
        utils::sep_to(&mut out)
    }
}
