//! 射流宽度估计.
//!
//! 射流大致沿图像水平方向流动, 逐列统计掩码像素个数即得到该列处的表观宽度.
//! 当射流相对图像轴线倾斜 `θ` 时, 表观宽度是真实 (垂直于流向的) 宽度的
//! `1 / cos θ` 倍, 因此需要乘以 [`angle_correction`] 给出的修正系数.

use crate::data::StreamMask;
use crate::error::MeasureError;
use crate::Idx2d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单张图像的射流宽度统计 (单位: 微米).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WidthMeasurement {
    /// 平均宽度.
    pub mean_width_um: f64,

    /// 宽度的总体标准差.
    pub std_width_um: f64,
}

/// 掩码四个极端角点, 以 `(行, 列)` 表示.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Corners {
    /// 最左非空列的最上像素.
    pub upper_left: Idx2d,
    /// 最右非空列的最上像素.
    pub upper_right: Idx2d,
    /// 最左非空列的最下像素.
    pub lower_left: Idx2d,
    /// 最右非空列的最下像素.
    pub lower_right: Idx2d,
}

impl Corners {
    /// 上边缘倾角 (弧度).
    #[inline]
    pub fn top_angle(&self) -> f64 {
        tilt(self.upper_left, self.upper_right)
    }

    /// 下边缘倾角 (弧度).
    #[inline]
    pub fn bottom_angle(&self) -> f64 {
        tilt(self.lower_left, self.lower_right)
    }
}

/// 从左点到右点的倾角. 两点同列时视为不倾斜.
#[inline]
fn tilt((h0, w0): Idx2d, (h1, w1): Idx2d) -> f64 {
    if w1 == w0 {
        return 0.0;
    }
    ((h1 as f64 - h0 as f64) / (w1 as f64 - w0 as f64)).atan()
}

/// 逐列统计射流像素个数. 返回长度等于掩码宽度.
pub fn column_counts(mask: &StreamMask) -> Vec<usize> {
    (0..mask.width())
        .map(|w| mask.column(w).iter().filter(|p| **p).count())
        .collect()
}

/// 定位掩码的四个极端角点.
pub fn corners(mask: &StreamMask) -> Corners {
    let occupied = |w: usize| mask.column(w).iter().any(|p| *p);
    // 掩码至少有一个像素, 因此一定存在非空列.
    let left = (0..mask.width()).find(|w| occupied(*w)).unwrap_or(0);
    let right = (0..mask.width()).rfind(|w| occupied(*w)).unwrap_or(left);

    let top_bottom = |w: usize| {
        let col = mask.column(w);
        let top = col.iter().position(|p| *p).unwrap_or(0);
        let bottom = col
            .iter()
            .enumerate()
            .filter_map(|(h, p)| p.then_some(h))
            .last()
            .unwrap_or(top);
        (top, bottom)
    };
    let (lt, lb) = top_bottom(left);
    let (rt, rb) = top_bottom(right);

    Corners {
        upper_left: (lt, left),
        upper_right: (rt, right),
        lower_left: (lb, left),
        lower_right: (rb, right),
    }
}

/// 倾斜修正系数 `cos((θ_top + θ_bottom) / 2)`, 取值 `(0, 1]`.
///
/// 掩码只占一列时无法估计倾角, 返回 1.
pub fn angle_correction(mask: &StreamMask) -> f64 {
    let c = corners(mask);
    let (top, bottom) = (c.top_angle(), c.bottom_angle());
    log::debug!("width.angle_correction | corners: {c:?}, top: {top:.6}, bottom: {bottom:.6}");
    ((top + bottom) / 2.0).cos()
}

/// 将列宽换算为物理单位, 丢弃零值后求平均值与总体标准差.
///
/// 没有任何非零列宽时返回 [`MeasureError::EmptyMeasurement`].
pub fn width_stats(
    counts: &[usize],
    um_per_pixel: f64,
    correction: f64,
) -> Result<WidthMeasurement, MeasureError> {
    let scale = um_per_pixel * correction;
    let widths: Vec<f64> = counts
        .iter()
        .map(|c| *c as f64 * scale)
        .filter(|w| *w != 0.0)
        .collect();
    if widths.is_empty() {
        return Err(MeasureError::EmptyMeasurement);
    }

    let n = widths.len() as f64;
    let mean = widths.iter().sum::<f64>() / n;
    let var = widths.iter().map(|w| (w - mean) * (w - mean)).sum::<f64>() / n;
    Ok(WidthMeasurement {
        mean_width_um: mean,
        std_width_um: var.sqrt(),
    })
}

/// 对射流掩码完成列统计、倾斜修正与宽度统计.
pub fn measure(mask: &StreamMask, um_per_pixel: f64) -> Result<WidthMeasurement, MeasureError> {
    width_stats(&column_counts(mask), um_per_pixel, angle_correction(mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn mask(data: Array2<bool>) -> StreamMask {
        StreamMask::from_array(data).unwrap()
    }

    /// 上边缘在 `span` 列内下降 `delta` 行的平行四边形, 每列高 `h`.
    fn sheared(span: usize, delta: usize, h: usize) -> StreamMask {
        let r0 = 2;
        mask(Array2::from_shape_fn((r0 + delta + h + 3, span + 1), |(r, c)| {
            let top = r0 + c * delta / span;
            (top..top + h).contains(&r)
        }))
    }

    #[test]
    fn test_untilted_is_identity() {
        let m = mask(Array2::from_shape_fn((10, 12), |(r, c)| {
            (3..7).contains(&r) && (1..11).contains(&c)
        }));
        assert_eq!(angle_correction(&m), 1.0);
        assert_eq!(column_counts(&m)[0], 0);
        assert_eq!(column_counts(&m)[5], 4);
    }

    #[test]
    fn test_tilt_formula() {
        for (span, delta) in [(40, 8), (30, 30), (50, 3)] {
            let m = sheared(span, delta, 6);
            let c = corners(&m);
            assert_eq!(c.upper_left, (2, 0));
            assert_eq!(c.upper_right, (2 + delta, span));
            assert_eq!(c.lower_right, (2 + delta + 5, span));
            let expected = (delta as f64 / span as f64).atan().cos();
            assert!(f64_eq(angle_correction(&m), expected));
        }
    }

    #[test]
    fn test_tilt_sign_does_not_matter() {
        // 上升与下降的射流给出相同的修正.
        let down = sheared(20, 5, 4);
        let up = mask(down.array_view().slice(ndarray::s![.., ..;-1]).to_owned());
        assert!(f64_eq(angle_correction(&down), angle_correction(&up)));
    }

    #[test]
    fn test_single_column() {
        let m = mask(Array2::from_shape_fn((5, 5), |(r, c)| c == 2 && r > 0));
        assert_eq!(angle_correction(&m), 1.0);
    }

    #[test]
    fn test_zero_columns_excluded() {
        let s = width_stats(&[0, 3, 0, 5, 4, 0], 2.0, 1.0).unwrap();
        assert!(f64_eq(s.mean_width_um, 8.0));
        assert!(f64_eq(s.std_width_um, (8.0_f64 / 3.0).sqrt()));
    }

    #[test]
    fn test_empty_measurement() {
        assert_eq!(
            width_stats(&[0, 0, 0], 1.5, 1.0).unwrap_err(),
            MeasureError::EmptyMeasurement
        );
        assert_eq!(
            width_stats(&[4, 4], 1.5, 0.0).unwrap_err(),
            MeasureError::EmptyMeasurement
        );
    }

    #[test]
    fn test_measure_rectangle() {
        let m = mask(Array2::from_shape_fn((8, 6), |(r, _)| (2..5).contains(&r)));
        let s = measure(&m, 0.5).unwrap();
        assert!(f64_eq(s.mean_width_um, 1.5));
        assert!(f64_eq(s.std_width_um, 0.0));
    }
}
