use crate::consts::label::is_stream;
use crate::data::{LabelGrid, StreamMask};
use crate::error::RegionError;
use crate::{Area2d, Idx2d};
use ndarray::Array2;
use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 区域外接矩形 (闭区间).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    /// 最小行号.
    pub row_min: usize,
    /// 最小列号.
    pub col_min: usize,
    /// 最大行号.
    pub row_max: usize,
    /// 最大列号.
    pub col_max: usize,
}

impl BoundingBox {
    /// 单个像素的外接矩形.
    #[inline]
    fn at((h, w): Idx2d) -> Self {
        Self {
            row_min: h,
            col_min: w,
            row_max: h,
            col_max: w,
        }
    }

    /// 扩展以包含 `(h, w)`.
    #[inline]
    fn extend(&mut self, (h, w): Idx2d) {
        self.row_min = self.row_min.min(h);
        self.row_max = self.row_max.max(h);
        self.col_min = self.col_min.min(w);
        self.col_max = self.col_max.max(w);
    }

    /// 列跨度 `col_max - col_min`. 区域宽窄以此比较.
    #[inline]
    pub fn col_span(&self) -> usize {
        self.col_max - self.col_min
    }
}

/// 一个极大 8-连通射流候选区域.
#[derive(Clone, Debug)]
pub struct ConnectedRegion {
    /// 区域编号, 从 1 开始, 按区域首个像素的行优先顺序分配.
    pub label: u32,

    /// 外接矩形.
    pub bbox: BoundingBox,

    /// 像素个数.
    pub pixel_count: usize,

    pixels: Area2d,
}

impl ConnectedRegion {
    /// 区域内的所有像素索引 (广度优先顺序).
    #[inline]
    pub fn pixels(&self) -> &[Idx2d] {
        &self.pixels
    }
}

/// 一张标签图上的全部连通区域.
#[derive(Clone, Debug)]
pub struct RegionSet {
    shape: Idx2d,
    regions: Vec<ConnectedRegion>,
}

impl RegionSet {
    /// 源标签图形状.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.shape
    }

    /// 区域个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// 是否没有任何区域.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// 按编号升序迭代区域.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ConnectedRegion> {
        self.regions.iter()
    }

    /// 列跨度最大的区域. 跨度相同时取编号最小者. 集合为空时返回 `None`.
    pub fn widest(&self) -> Option<&ConnectedRegion> {
        self.regions.iter().fold(None, |best, r| match best {
            Some(b) if b.bbox.col_span() >= r.bbox.col_span() => Some(b),
            _ => Some(r),
        })
    }
}

/// 按照 8-相邻规则提取所有射流候选区域.
///
/// 两个像素属于同一个区域, 当且仅当存在一条连接它们的 8-相邻路径,
/// 且路径上的所有像素都是射流候选.
pub fn label_regions(grid: &LabelGrid) -> RegionSet {
    let shape = grid.shape();
    let mut visited = Array2::from_elem(shape, false);
    let mut bfs_q: VecDeque<Idx2d> = VecDeque::with_capacity(16);
    let mut regions = Vec::with_capacity(1);

    for (seed, &pix) in grid.array_view().indexed_iter() {
        if visited[seed] || !is_stream(pix) {
            continue;
        }
        visited[seed] = true;
        bfs_q.push_back(seed);

        let mut pixels = Area2d::with_capacity(16);
        let mut bbox = BoundingBox::at(seed);
        while let Some(cur) = bfs_q.pop_front() {
            pixels.push(cur);
            bbox.extend(cur);
            for neigh in grid.n8_positions(cur) {
                if !visited[neigh] && is_stream(grid[neigh]) {
                    visited[neigh] = true;
                    bfs_q.push_back(neigh);
                }
            }
        }

        regions.push(ConnectedRegion {
            label: regions.len() as u32 + 1,
            bbox,
            pixel_count: pixels.len(),
            pixels,
        });
    }
    log::trace!("eight.label_regions | {} region(s)", regions.len());

    RegionSet { shape, regions }
}

/// 选取列跨度最大的区域作为射流掩码. 跨度相同时取编号最小者.
///
/// 集合为空时返回 [`RegionError::NoRegionFound`].
pub fn select_widest(regions: &RegionSet) -> Result<StreamMask, RegionError> {
    let best = regions.widest().ok_or(RegionError::NoRegionFound)?;
    log::debug!(
        "eight.select_widest | region #{} of {}, span {}, {} px",
        best.label,
        regions.len(),
        best.bbox.col_span(),
        best.pixel_count
    );
    Ok(StreamMask::from_area(regions.shape, best.pixels()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid(data: Array2<u8>) -> LabelGrid {
        LabelGrid::from_array(data).unwrap()
    }

    #[test]
    fn test_diagonal_is_connected() {
        let g = grid(array![
            [1, 0, 0, 0],
            [0, 1, 0, 0],
            [0, 0, 1, 0],
            [0, 0, 0, 1],
        ]);
        let set = label_regions(&g);
        assert_eq!(set.len(), 1);
        let r = set.iter().next().unwrap();
        assert_eq!(r.pixel_count, 4);
        assert_eq!(
            r.bbox,
            BoundingBox {
                row_min: 0,
                col_min: 0,
                row_max: 3,
                col_max: 3
            }
        );
    }

    #[test]
    fn test_regions_and_labels() {
        let g = grid(array![
            [1, 1, 0, 0, 1],
            [0, 0, 0, 0, 1],
            [0, 1, 1, 1, 0],
        ]);
        let set = label_regions(&g);
        // 右上角与底部一行经 (1, 4) -> (2, 3) 对角相连.
        assert_eq!(set.len(), 2);
        let labels: Vec<_> = set.iter().map(|r| (r.label, r.pixel_count)).collect();
        assert_eq!(labels, vec![(1, 2), (2, 5)]);
    }

    #[test]
    fn test_select_widest_by_column_span() {
        // 区域 1: 高而窄; 区域 2: 矮而宽.
        let g = grid(array![
            [1, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 0],
            [0, 0, 1, 1, 1, 1],
        ]);
        let set = label_regions(&g);
        let mask = select_widest(&set).unwrap();
        assert_eq!(mask.count(), 4);
        assert!(mask[(4, 2)] && !mask[(0, 0)]);
    }

    #[test]
    fn test_tie_goes_to_lowest_label() {
        let g = grid(array![
            [0, 1, 1, 0, 0],
            [0, 0, 0, 0, 0],
            [1, 1, 0, 1, 1],
        ]);
        let set = label_regions(&g);
        assert_eq!(set.len(), 3);
        assert!(set.iter().all(|r| r.bbox.col_span() == 1));
        let mask = select_widest(&set).unwrap();
        assert!(mask[(0, 1)] && mask[(0, 2)]);
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn test_no_region_found() {
        let g = grid(Array2::zeros((4, 6)));
        let set = label_regions(&g);
        assert!(set.is_empty());
        assert_eq!(select_widest(&set).unwrap_err(), RegionError::NoRegionFound);
    }
}
