//! 射流/背景两类无监督分割.
//!
//! 1. [`cluster`]: 以像素通道向量做两类 k-means, 得到未定向的标签图;
//! 2. [`orient`]: 以图像首行为参照, 规范化 "哪一类是背景".

mod kmeans;

use crate::consts::{
    label, DEFAULT_MAX_ITER, DEFAULT_RESTARTS, DEFAULT_SEED, DEFAULT_TOLERANCE, TOP_ROW_THRESHOLD,
};
use crate::data::{ByteImage, LabelGrid};
use kmeans::KMeans2;
use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 聚类参数.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClusterSpec {
    /// 随机种子. 第 `r` 次重启使用 `seed + r`.
    pub seed: u64,

    /// 重启次数 (最少 1 次), 取惯性最小的结果.
    pub restarts: u32,

    /// 单次运行的最大迭代次数.
    pub max_iter: u32,

    /// 收敛阈值: 一轮迭代中两个质心移动距离的平方和.
    pub tolerance: f64,
}

impl ClusterSpec {
    /// 仅指定种子, 其余取默认值.
    #[inline]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for ClusterSpec {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            restarts: DEFAULT_RESTARTS,
            max_iter: DEFAULT_MAX_ITER,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// 背景方向规范化模式.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OrientMode {
    /// 首行多数属于类别 1 时交换两类标签.
    #[default]
    Apply,

    /// 只计算方向而不交换, 与旧数据处理流程的结果保持一致.
    Legacy,
}

/// 对 8-bit 图像的全部像素做两类聚类.
///
/// 返回的标签图中 0/1 只区分两类, 不代表背景/射流.
pub fn cluster(image: &ByteImage, spec: &ClusterSpec) -> LabelGrid {
    let (h, w) = image.plane_shape();
    let view = image.array_view();
    let points = Array2::from_shape_fn((h * w, image.channels()), |(i, k)| {
        view[(i / w, i % w, k)] as f64
    });

    let part = KMeans2::new(points.view(), spec.max_iter, spec.tolerance)
        .best_of(spec.seed, spec.restarts);
    log::debug!(
        "segment.cluster | centroids: {:?}, iterations: {}",
        part.centroids.rows().into_iter().map(|r| r.to_vec()).collect::<Vec<_>>(),
        part.iterations
    );

    match Array2::from_shape_vec((h, w), part.labels) {
        Ok(data) => LabelGrid::new(data),
        Err(_) => unreachable!("标签数与像素数一致"),
    }
}

/// 首行平均标签值是否超过阈值, 即类别 1 是否应被视为背景.
pub fn needs_inversion(grid: &LabelGrid) -> bool {
    if grid.height() == 0 || grid.width() == 0 {
        return false;
    }
    let row = grid.row(0);
    let mean = row.iter().map(|p| *p as f64).sum::<f64>() / row.len() as f64;
    mean > TOP_ROW_THRESHOLD
}

/// 规范化标签方向: 输出中背景为 [`label::BACKGROUND`], 射流候选为 [`label::STREAM`].
pub fn orient(mut grid: LabelGrid, mode: OrientMode) -> LabelGrid {
    if needs_inversion(&grid) {
        match mode {
            OrientMode::Apply => grid.invert(),
            OrientMode::Legacy => {
                log::debug!("segment.orient | inversion needed but skipped (legacy)");
            }
        }
    }
    debug_assert!(grid.array_view().iter().all(|p| *p <= label::STREAM));
    grid
}

/// 聚类并规范化方向.
#[inline]
pub fn segment(image: &ByteImage, spec: &ClusterSpec, mode: OrientMode) -> LabelGrid {
    orient(cluster(image, spec), mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    /// 左 `k` 列为背景色, 其余为射流色.
    fn bisected(h: usize, w: usize, k: usize) -> ByteImage {
        ByteImage::new(Array3::from_shape_fn((h, w, 3), |(_, col, c)| {
            if col < k {
                [230, 230, 240][c]
            } else {
                [40, 60, 50][c]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_cluster_separates_colors() {
        let g = cluster(&bisected(6, 10, 4), &ClusterSpec::default());
        let v = g.array_view();
        assert!(v.rows().into_iter().all(|r| r[0] == r[3] && r[4] == r[9]));
        assert_ne!(v[(0, 0)], v[(0, 9)]);
    }

    #[test]
    fn test_orient_puts_background_at_zero() {
        // 首行全部为 1, 需要翻转.
        let g = LabelGrid::from_array(array![[1, 1, 1], [1, 0, 1], [1, 0, 1]]).unwrap();
        assert!(needs_inversion(&g));
        let o = orient(g.clone(), OrientMode::Apply);
        assert_eq!(o.into_raw(), array![[0, 0, 0], [0, 1, 0], [0, 1, 0]]);

        let legacy = orient(g.clone(), OrientMode::Legacy);
        assert_eq!(legacy, g);
    }

    #[test]
    fn test_orient_threshold_is_strict() {
        // 首行恰好一半为 1: 平均值 0.5 不超过阈值, 不翻转.
        let g = LabelGrid::from_array(array![[1, 0], [1, 1]]).unwrap();
        assert!(!needs_inversion(&g));
        assert_eq!(orient(g.clone(), OrientMode::Apply), g);
    }

    #[test]
    fn test_segment_stream_is_one() {
        // 首行同时包含背景和射流, 但背景占多数.
        let g = segment(&bisected(5, 10, 7), &ClusterSpec::with_seed(3), OrientMode::Apply);
        assert_eq!(g.count(label::STREAM), 5 * 3);
        assert_eq!(g[(2, 8)], label::STREAM);
        assert_eq!(g[(2, 1)], label::BACKGROUND);
    }

    #[test]
    fn test_uniform_image_has_no_stream() {
        let img = ByteImage::new(Array3::from_elem((4, 4, 1), 128)).unwrap();
        let g = segment(&img, &ClusterSpec::default(), OrientMode::Apply);
        assert_eq!(g.count(label::STREAM), 0);
    }
}
