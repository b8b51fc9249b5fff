//! 射流宽度批量测量.
//!
//! 用法: `measure [文件名前缀] [扩展名]`, 默认测量目录下全部 `png` 图像.
//!
//! 配置全部来自环境变量, 见 `utils::loader`. 日志级别由 `$STREAM_LOG` 控制, 默认 `info`.

mod result;
mod runner;

use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::process::ExitCode;

fn log_level() -> LevelFilter {
    std::env::var("STREAM_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn main() -> ExitCode {
    if let Err(e) = SimpleLogger::new().with_level(log_level()).init() {
        eprintln!("failed to install logger: {e}");
    }

    let mut args = std::env::args().skip(1);
    let prefix = args.next().unwrap_or_default();
    let extension = args.next().unwrap_or_else(|| "png".to_string());

    match runner::run(&prefix, &extension) {
        Ok(report) => match report.analyze() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("failed to write report: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
