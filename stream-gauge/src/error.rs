//! 运行时错误.
//!
//! 每个处理阶段只产生自己的错误类型; 批处理驱动器会将它们包装为 [`StageError`],
//! 并在需要时附上图像索引和来源描述, 形成 [`BatchError`].

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 归一化 / 明场校正错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreprocessError {
    /// 明场参考图退化 (全零, 含零像素或非有限值), 无法作为除数.
    #[error("invalid brightfield reference: {0}")]
    InvalidBrightfield(&'static str),

    /// 图像与明场参考图形状不一致. 参数依次为 (图像形状, 参考图形状).
    #[error("shape mismatch: image {0:?}, reference {1:?}")]
    ShapeMismatch((usize, usize, usize), (usize, usize, usize)),

    /// 浮点图像像素超出 `[0, 1]`, 或不是有限值.
    ///
    /// 这通常意味着调用者把已经是 0-255 的数据当作浮点图像传入.
    #[error("float pixel {0} is outside [0, 1]")]
    OutOfRange(f32),

    /// 图像没有任何像素.
    #[error("image has no pixels")]
    EmptyImage,

    /// 通道数既不是 1 也不是 3.
    #[error("unsupported channel count {0}, expected 1 or 3")]
    UnsupportedChannels(usize),
}

/// 连通区域选取错误.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionError {
    /// 分割结果中不存在任何射流候选像素.
    #[error("no connected stream region found")]
    NoRegionFound,
}

/// 宽度统计错误.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MeasureError {
    /// 去掉零值列后没有任何可用的列宽.
    #[error("every column width is zero after correction")]
    EmptyMeasurement,
}

/// 标定参数错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// `um_per_pixel` 必须是有限正数.
    #[error("um_per_pixel must be finite and positive, got {0}")]
    InvalidScale(f64),

    /// 标定线段两端点重合, 或物理长度非正.
    #[error("calibration segment is degenerate")]
    DegenerateSegment,

    /// 感兴趣区域掩码与图像形状不一致. 参数依次为 (图像形状, 掩码形状).
    #[error("roi mask shape {1:?} does not match image shape {0:?}")]
    RoiShapeMismatch((usize, usize), (usize, usize)),

    /// 明场参考图本身无效.
    #[error(transparent)]
    Brightfield(#[from] PreprocessError),
}

/// 图像加载错误. 由外部解码器产生.
#[derive(Debug, Error)]
pub enum LoadError {
    /// 底层 I/O 错误.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// 文件路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },

    /// 普通栅格图像解码错误.
    #[error("failed to decode '{path}': {source}")]
    Image {
        /// 文件路径.
        path: PathBuf,
        /// 底层错误.
        source: image::ImageError,
    },

    /// `.npy` 数组读取错误.
    #[error("failed to read npy '{path}': {source}")]
    Npy {
        /// 文件路径.
        path: PathBuf,
        /// 底层错误.
        source: ndarray_npy::ReadNpyError,
    },

    /// 解码得到的数据形状不是 `H×W×C`.
    #[error("decoded data has an unusable shape: {0}")]
    Shape(String),
}

/// 单张图像处理流水线中的阶段.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 加载图像.
    Load,

    /// 归一化 / 明场校正.
    Preprocess,

    /// 两类聚类及方向规范化.
    Segment,

    /// 连通区域提取与最宽区域选取.
    Region,

    /// 列宽统计.
    Measure,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Load => "load",
            Stage::Preprocess => "preprocess",
            Stage::Segment => "segment",
            Stage::Region => "region",
            Stage::Measure => "measure",
        };
        f.write_str(s)
    }
}

/// 单张图像在某一阶段失败的原因.
#[derive(Debug, Error)]
pub enum StageError {
    /// 加载失败.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// 预处理失败.
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// 区域选取失败.
    #[error(transparent)]
    Region(#[from] RegionError),

    /// 宽度统计失败.
    #[error(transparent)]
    Measure(#[from] MeasureError),

    /// 图像与标定参数不兼容 (如感兴趣区域掩码形状不符).
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

impl StageError {
    /// 该错误源自哪个阶段.
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Load(_) => Stage::Load,
            StageError::Preprocess(_) => Stage::Preprocess,
            StageError::Region(_) => Stage::Region,
            StageError::Measure(_) => Stage::Measure,
            StageError::Calibration(_) => Stage::Segment,
        }
    }
}

/// 批处理错误.
#[derive(Debug, Error)]
pub enum BatchError {
    /// 第 `index` 张图像失败, 整个批次中止. 不产生该图像及其后图像的结果.
    #[error("batch aborted at image #{index} (0-based, {source_desc}) during {stage}: {error}")]
    Abort {
        /// 输入序列中的索引 (从 0 开始).
        index: usize,
        /// 图像来源描述.
        source_desc: String,
        /// 失败阶段.
        stage: Stage,
        /// 原始错误.
        #[source]
        error: StageError,
    },

    /// 处理第 `index` 张图像之前检测到取消请求.
    #[error("batch cancelled before image #{index} (0-based)")]
    Cancelled {
        /// 尚未处理的第一张图像索引.
        index: usize,
    },

    /// 列名个数与每条结果的字段个数不一致.
    #[error("expected {expected} column names, got {got}")]
    Arity {
        /// 期望的列数.
        expected: usize,
        /// 实际给出的列数.
        got: usize,
    },
}

impl BatchError {
    /// 由单阶段错误构建中止错误.
    pub(crate) fn abort(index: usize, source_desc: String, error: StageError) -> Self {
        BatchError::Abort {
            index,
            source_desc,
            stage: error.stage(),
            error,
        }
    }
}
