use crate::consts::label::{BACKGROUND, STREAM};
use crate::Idx2d;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use std::ops::Index;

/// 逐像素的两类标签图. 像素值只能是 0 或 1.
///
/// 聚类直接产生的标签图中 "1" 不一定代表射流; 经过方向规范化后,
/// 约定 [`BACKGROUND`] 为背景, [`STREAM`] 为射流候选.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelGrid {
    data: Array2<u8>,
}

impl LabelGrid {
    /// 直接初始化. 调用者保证数据只含 0 和 1.
    #[inline]
    pub(crate) fn new(data: Array2<u8>) -> Self {
        debug_assert!(data.iter().all(|p| *p <= STREAM));
        Self { data }
    }

    /// 从外部数据构建. 若存在 0 和 1 以外的值, 返回 `None`.
    pub fn from_array(data: Array2<u8>) -> Option<Self> {
        data.iter()
            .all(|p| matches!(*p, BACKGROUND | STREAM))
            .then_some(Self { data })
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<u8> {
        self.data.view()
    }

    /// 第 `h` 行的标签.
    #[inline]
    pub fn row(&self, h: usize) -> ArrayView1<u8> {
        self.data.index_axis(Axis(0), h)
    }

    /// 统计值为 `label` 的像素个数.
    #[inline]
    pub fn count(&self, label: u8) -> usize {
        self.data.iter().filter(|&p| *p == label).count()
    }

    /// 交换两类标签.
    pub fn invert(&mut self) {
        self.data.mapv_inplace(|p| STREAM - p);
    }

    /// 将 `keep` 为 `false` 的位置强制设为背景.
    ///
    /// 两者形状必须一致, 否则 panic.
    pub fn retain(&mut self, keep: ArrayView2<bool>) {
        assert_eq!(self.data.dim(), keep.dim(), "掩码形状不符");
        for (p, &k) in self.data.iter_mut().zip(keep.iter()) {
            if !k {
                *p = BACKGROUND;
            }
        }
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }
}

impl Index<Idx2d> for LabelGrid {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 被选中的射流区域掩码. 至少包含一个 `true` 像素.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamMask {
    data: Array2<bool>,
}

impl StreamMask {
    /// 从外部数据构建. 若没有任何 `true` 像素, 返回 `None`.
    pub fn from_array(data: Array2<bool>) -> Option<Self> {
        data.iter().any(|p| *p).then_some(Self { data })
    }

    /// 在 `shape` 大小的空白掩码上点亮 `area` 中的像素.
    pub(crate) fn from_area(shape: Idx2d, area: &[Idx2d]) -> Self {
        debug_assert!(!area.is_empty());
        let mut data = Array2::from_elem(shape, false);
        for pos in area.iter().copied() {
            data[pos] = true;
        }
        Self { data }
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<bool> {
        self.data.view()
    }

    /// 射流像素总数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|p| **p).count()
    }

    /// 第 `w` 列的像素.
    #[inline]
    pub fn column(&self, w: usize) -> ArrayView1<bool> {
        self.data.index_axis(Axis(1), w)
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<bool> {
        self.data
    }
}

impl Index<Idx2d> for StreamMask {
    type Output = bool;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 二维网格通用的不可变方法集合.
macro_rules! impl_grid_immut {
    ($grid: ty) => {
        /// 形状与邻域方法集合.
        impl $grid {
            /// 网格的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                self.data.dim()
            }

            /// 网格的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 网格的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h < h_len && w < w_len
            }

            /// 获得 `pos` 的 8-邻域像素索引. 保证返回的索引都不越界.
            pub fn n8_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
                crate::eight::neighbour8(pos)
                    .into_iter()
                    .filter(|p| self.check(*p))
                    .collect()
            }
        }
    };
}

impl_grid_immut!(LabelGrid);
impl_grid_immut!(StreamMask);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_label_grid_from_array() {
        assert!(LabelGrid::from_array(array![[0, 1], [2, 0]]).is_none());
        let mut g = LabelGrid::from_array(array![[0, 1], [1, 1]]).unwrap();
        assert_eq!(g.count(STREAM), 3);
        g.invert();
        assert_eq!(g.into_raw(), array![[1, 0], [0, 0]]);
    }

    #[test]
    fn test_label_grid_retain() {
        let mut g = LabelGrid::new(Array2::from_elem((2, 3), STREAM));
        g.retain(array![[true, false, true], [false, true, true]].view());
        assert_eq!(g.into_raw(), array![[1, 0, 1], [0, 1, 1]]);
    }

    #[test]
    fn test_n8_positions_clipped() {
        let g = LabelGrid::new(Array2::zeros((3, 3)));
        assert_eq!(g.n8_positions((0, 0)).len(), 3);
        assert_eq!(g.n8_positions((1, 1)).len(), 8);
        assert_eq!(g.n8_positions((2, 1)).len(), 5);
    }

    #[test]
    fn test_stream_mask_needs_a_pixel() {
        assert!(StreamMask::from_array(Array2::from_elem((2, 2), false)).is_none());
        let m = StreamMask::from_area((2, 3), &[(0, 1), (1, 2)]);
        assert_eq!(m.count(), 2);
        assert!(m[(1, 2)]);
        assert_eq!(m.column(1).to_vec(), vec![true, false]);
    }
}
