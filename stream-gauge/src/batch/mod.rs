//! 批处理驱动器.
//!
//! 对每个图像来源依次执行 加载 -> 预处理 -> 分割 -> 区域选取 -> 宽度统计,
//! 并按输入顺序收集结果. 默认在第一个失败处中止整个批次.

mod observer;
mod table;

pub use observer::{BatchObserver, LogObserver};
pub use table::{Table, TABLE_ARITY};

use crate::calib::Calibration;
use crate::data::RawImage;
use crate::eight::{label_regions, select_widest};
use crate::error::{BatchError, StageError};
use crate::preproc::preprocess;
use crate::segment::{segment, ClusterSpec, OrientMode};
use crate::source::ImageSource;
use crate::width::{measure, WidthMeasurement};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use std::sync::atomic::AtomicUsize;
        use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
    }
}

/// 单张图像失败时的处理策略.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// 任何失败都中止整个批次, 不产生失败图像及其后图像的结果.
    #[default]
    FailFast,

    /// 记录失败图像并继续处理后续图像.
    Skip,
}

/// 流水线配置.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PipelineSpec {
    /// 聚类参数.
    pub cluster: ClusterSpec,

    /// 背景方向规范化模式.
    pub orient: OrientMode,

    /// 失败处理策略.
    pub policy: FailurePolicy,
}

/// 协作式取消标志. 克隆后共享同一个状态.
///
/// 驱动器在处理每张图像之前检查该标志.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// 初始化一个未取消的标志.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消.
    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// 是否已请求取消.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// 一条成功的测量结果及其在输入序列中的索引.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BatchEntry {
    /// 输入索引 (从 0 开始).
    pub index: usize,

    /// 测量结果.
    pub measurement: WidthMeasurement,
}

/// 批处理结果, 按输入顺序排列.
///
/// 快速失败策略下, 结果恰好对应输入序列的全部图像; 跳过策略下,
/// 失败图像的索引记录在 [`BatchResult::skipped`] 中.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchResult {
    entries: Vec<BatchEntry>,
    skipped: Vec<usize>,
}

impl BatchResult {
    fn with_capacity(n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(n),
            skipped: Vec::new(),
        }
    }

    /// 成功结果个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有任何成功结果.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 全部成功结果.
    #[inline]
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// 按顺序迭代测量结果.
    #[inline]
    pub fn measurements(&self) -> impl ExactSizeIterator<Item = &WidthMeasurement> {
        self.entries.iter().map(|e| &e.measurement)
    }

    /// 被跳过的图像索引, 升序.
    #[inline]
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    /// 以给定列名生成结果表.
    ///
    /// 列名个数必须等于 [`TABLE_ARITY`], 否则返回 [`BatchError::Arity`].
    pub fn to_table<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table, BatchError> {
        let [a, b] = columns else {
            return Err(BatchError::Arity {
                expected: TABLE_ARITY,
                got: columns.len(),
            });
        };
        let rows = self
            .entries
            .iter()
            .map(|e| {
                let m = &e.measurement;
                (e.index, [m.mean_width_um, m.std_width_um])
            })
            .collect();
        Ok(Table::new(
            [a.as_ref().to_owned(), b.as_ref().to_owned()],
            rows,
        ))
    }

    fn settle(
        &mut self,
        observer: &dyn BatchObserver,
        policy: FailurePolicy,
        index: usize,
        source_desc: String,
        outcome: Result<WidthMeasurement, StageError>,
    ) -> Result<(), BatchError> {
        match outcome {
            Ok(measurement) => {
                observer.on_image(index, &source_desc, &measurement);
                self.entries.push(BatchEntry { index, measurement });
            }
            Err(e) => match policy {
                FailurePolicy::FailFast => return Err(BatchError::abort(index, source_desc, e)),
                FailurePolicy::Skip => {
                    observer.on_skip(index, &source_desc, &e);
                    self.skipped.push(index);
                }
            },
        }
        Ok(())
    }
}

/// 对单张已解码图像运行完整流水线.
pub fn process_image(
    image: &RawImage,
    calib: &Calibration,
    spec: &PipelineSpec,
) -> Result<WidthMeasurement, StageError> {
    let bytes = preprocess(image, calib.brightfield())?;
    let mut grid = segment(&bytes, &spec.cluster, spec.orient);
    if let Some(roi) = calib.roi() {
        calib.check_roi(grid.shape())?;
        grid.retain(roi);
    }
    let regions = label_regions(&grid);
    let mask = select_widest(&regions)?;
    let m = measure(&mask, calib.um_per_pixel())?;
    log::trace!(
        "batch.process_image | shape: {:?}, mean: {:.4}, std: {:.4}",
        image.shape(),
        m.mean_width_um,
        m.std_width_um
    );
    Ok(m)
}

/// 以默认配置顺序处理全部图像. 快速失败.
#[inline]
pub fn process_sequence<S: ImageSource>(
    sources: &[S],
    calib: &Calibration,
) -> Result<BatchResult, BatchError> {
    BatchDriver::new(calib).run(sources)
}

/// 以默认配置并行处理全部图像. 结果与 [`process_sequence`] 完全一致.
#[cfg(feature = "rayon")]
#[inline]
pub fn process_sequence_par<S: ImageSource + Sync>(
    sources: &[S],
    calib: &Calibration,
) -> Result<BatchResult, BatchError> {
    BatchDriver::new(calib).run_par(sources)
}

/// 可配置的批处理驱动器.
///
/// ```ignore
/// let result = BatchDriver::new(&calib)
///     .with_spec(spec)
///     .with_observer(&LogObserver)
///     .run(&sources)?;
/// ```
pub struct BatchDriver<'a> {
    calib: &'a Calibration,
    spec: PipelineSpec,
    observer: &'a dyn BatchObserver,
    cancel: Option<CancelFlag>,
}

impl<'a> BatchDriver<'a> {
    /// 以默认流水线配置和静默观察者初始化.
    pub fn new(calib: &'a Calibration) -> Self {
        Self {
            calib,
            spec: PipelineSpec::default(),
            observer: &(),
            cancel: None,
        }
    }

    /// 设置流水线配置.
    #[inline]
    pub fn with_spec(mut self, spec: PipelineSpec) -> Self {
        self.spec = spec;
        self
    }

    /// 设置进度观察者.
    #[inline]
    pub fn with_observer(mut self, observer: &'a dyn BatchObserver) -> Self {
        self.observer = observer;
        self
    }

    /// 设置取消标志.
    #[inline]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    fn process_one<S: ImageSource>(&self, source: &S) -> Result<WidthMeasurement, StageError> {
        let image = source.load()?;
        process_image(&image, self.calib, &self.spec)
    }

    /// 顺序处理.
    pub fn run<S: ImageSource>(&self, sources: &[S]) -> Result<BatchResult, BatchError> {
        self.observer.on_start(sources.len());
        let mut result = BatchResult::with_capacity(sources.len());

        for (index, source) in sources.iter().enumerate() {
            if self.is_cancelled() {
                return Err(BatchError::Cancelled { index });
            }
            let outcome = self.process_one(source);
            result.settle(self.observer, self.spec.policy, index, source.describe(), outcome)?;
        }

        self.observer.on_finish(result.len());
        Ok(result)
    }

    /// 借助 `rayon` 并行处理.
    ///
    /// 结果、错误与观察者回调都和 [`BatchDriver::run`] 一致: 按输入顺序收集,
    /// 快速失败时报告索引最小的失败图像. 已知更早的图像失败后, 后续图像不再处理.
    #[cfg(feature = "rayon")]
    pub fn run_par<S: ImageSource + Sync>(&self, sources: &[S]) -> Result<BatchResult, BatchError> {
        enum Outcome {
            Done(String, Result<WidthMeasurement, StageError>),
            Cancelled,
            NotRun,
        }

        self.observer.on_start(sources.len());
        let fail_fast = self.spec.policy == FailurePolicy::FailFast;
        let first_failure = AtomicUsize::new(usize::MAX);

        let outcomes: Vec<Outcome> = sources
            .par_iter()
            .enumerate()
            .map(|(index, source)| {
                if self.is_cancelled() {
                    return Outcome::Cancelled;
                }
                if fail_fast && index > first_failure.load(Ordering::Acquire) {
                    return Outcome::NotRun;
                }
                let outcome = self.process_one(source);
                if fail_fast && outcome.is_err() {
                    first_failure.fetch_min(index, Ordering::AcqRel);
                }
                Outcome::Done(source.describe(), outcome)
            })
            .collect();

        let mut result = BatchResult::with_capacity(sources.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Outcome::Done(desc, outcome) => {
                    result.settle(self.observer, self.spec.policy, index, desc, outcome)?
                }
                Outcome::Cancelled => return Err(BatchError::Cancelled { index }),
                // 更小索引处必有失败, 已在上一分支返回.
                Outcome::NotRun => continue,
            }
        }

        self.observer.on_finish(result.len());
        Ok(result)
    }
}
