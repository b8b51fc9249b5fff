//! 通用常量.

/// 单通道标签值.
pub mod label {
    /// 规范化后, 背景像素的标签值.
    pub const BACKGROUND: u8 = 0;

    /// 规范化后, 射流候选像素的标签值.
    pub const STREAM: u8 = 1;

    /// 像素是否是射流候选?
    #[inline]
    pub const fn is_stream(p: u8) -> bool {
        matches!(p, STREAM)
    }
}

/// 8-bit 图像的最大强度.
pub const U8_MAX_F32: f32 = 255.0;

/// 聚类的类别数. 射流与背景.
pub const CLUSTERS: usize = 2;

/// 判定首行属于类别 1 的阈值: 首行平均标签值超过它时, 类别 1 被视为背景.
pub const TOP_ROW_THRESHOLD: f64 = 0.5;

/// 默认聚类随机种子.
pub const DEFAULT_SEED: u64 = 0;

/// 默认聚类重启次数.
pub const DEFAULT_RESTARTS: u32 = 4;

/// 默认单次聚类最大迭代次数.
pub const DEFAULT_MAX_ITER: u32 = 100;

/// 默认聚类收敛阈值 (质心移动距离平方和).
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
