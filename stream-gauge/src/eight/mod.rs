//! 8-邻域连通区域提取与射流区域选取.

mod core;

pub use self::core::{label_regions, select_widest, BoundingBox, ConnectedRegion, RegionSet};

use crate::Idx2d;

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
///
/// 越过上/左边界的分量会回绕为极大值, 由调用者的越界检查过滤.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}
