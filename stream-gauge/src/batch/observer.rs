//! 批处理进度观察者.

use crate::error::StageError;
use crate::width::WidthMeasurement;

/// 批处理进度回调. 所有方法默认什么也不做.
///
/// 回调总是按输入顺序被调用, 并行驱动器也不例外.
pub trait BatchObserver: Sync {
    /// 批次开始, 共 `total` 张图像.
    fn on_start(&self, _total: usize) {}

    /// 第 `index` 张图像处理成功.
    fn on_image(&self, _index: usize, _source: &str, _measurement: &WidthMeasurement) {}

    /// 第 `index` 张图像失败并被跳过. 只在 [`FailurePolicy::Skip`](super::FailurePolicy::Skip) 下发生.
    fn on_skip(&self, _index: usize, _source: &str, _error: &StageError) {}

    /// 批次结束, 共产生 `produced` 条结果.
    fn on_finish(&self, _produced: usize) {}
}

/// 静默观察者.
impl BatchObserver for () {}

/// 通过 `log` 门面输出进度的观察者.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogObserver;

impl BatchObserver for LogObserver {
    fn on_start(&self, total: usize) {
        log::info!("batch | start, {total} image(s)");
    }

    fn on_image(&self, index: usize, source: &str, m: &WidthMeasurement) {
        log::info!(
            "batch | #{index} {source}: mean {:.3} um, std {:.3} um",
            m.mean_width_um,
            m.std_width_um
        );
    }

    fn on_skip(&self, index: usize, source: &str, error: &StageError) {
        log::warn!("batch | #{index} {source} skipped at {}: {error}", error.stage());
    }

    fn on_finish(&self, produced: usize) {
        log::info!("batch | finished, {produced} measurement(s)");
    }
}
