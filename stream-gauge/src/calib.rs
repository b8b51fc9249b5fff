//! 批次共享的标定参数.
//!
//! [`Calibration`] 在批次开始前构建一次, 之后只读地被所有图像共享.

use crate::data::RawImage;
use crate::error::CalibrationError;
use crate::preproc::Brightfield;
use crate::Idx2d;
use ndarray::{Array2, ArrayView2};

/// 标定参数: 像素到物理长度的换算, 可选的明场参考图与感兴趣区域掩码.
#[derive(Clone, Debug)]
pub struct Calibration {
    um_per_pixel: f64,
    brightfield: Option<Brightfield>,
    roi: Option<Array2<bool>>,
}

impl Calibration {
    /// 构建标定参数. `um_per_pixel` 必须是有限正数.
    pub fn new(um_per_pixel: f64) -> Result<Self, CalibrationError> {
        if !um_per_pixel.is_finite() || um_per_pixel <= 0.0 {
            return Err(CalibrationError::InvalidScale(um_per_pixel));
        }
        Ok(Self {
            um_per_pixel,
            brightfield: None,
            roi: None,
        })
    }

    /// 附加明场参考图. 参考图会在这里被校验和归一化, 批次内不再重复计算.
    pub fn with_brightfield(mut self, raw: &RawImage) -> Result<Self, CalibrationError> {
        self.brightfield = Some(Brightfield::new(raw)?);
        Ok(self)
    }

    /// 附加感兴趣区域掩码. 掩码为 `false` 的像素在区域提取前被强制视为背景.
    #[inline]
    pub fn with_roi(mut self, roi: Array2<bool>) -> Self {
        self.roi = Some(roi);
        self
    }

    /// 每像素对应的微米数.
    #[inline]
    pub fn um_per_pixel(&self) -> f64 {
        self.um_per_pixel
    }

    /// 明场参考图 (若有).
    #[inline]
    pub fn brightfield(&self) -> Option<&Brightfield> {
        self.brightfield.as_ref()
    }

    /// 感兴趣区域掩码 (若有).
    #[inline]
    pub fn roi(&self) -> Option<ArrayView2<bool>> {
        self.roi.as_ref().map(|r| r.view())
    }

    /// 检查掩码形状与图像平面形状 `shape` 是否一致. 没有掩码时总是通过.
    pub fn check_roi(&self, shape: Idx2d) -> Result<(), CalibrationError> {
        match &self.roi {
            Some(roi) if roi.dim() != shape => {
                Err(CalibrationError::RoiShapeMismatch(shape, roi.dim()))
            }
            _ => Ok(()),
        }
    }
}

/// 由图像上一段已知物理长度的线段求 `um_per_pixel`.
///
/// `p1`, `p2` 是线段两端的 `(x, y)` 像素坐标, `length_um` 是线段的实际长度.
pub fn um_per_pixel_from_segment(
    p1: (f64, f64),
    p2: (f64, f64),
    length_um: f64,
) -> Result<f64, CalibrationError> {
    let l_pix = (p2.0 - p1.0).hypot(p2.1 - p1.1);
    if !(l_pix > 0.0 && length_um > 0.0 && length_um.is_finite() && l_pix.is_finite()) {
        return Err(CalibrationError::DegenerateSegment);
    }
    Ok(length_um / l_pix)
}
