//! 图像与中间结果的基础数据结构.
//!
//! 所有图像均按 `(高, 宽, 通道)` 的形状保存, 通道数只能是 1 或 3.

mod grid;

pub use grid::{LabelGrid, StreamMask};

use crate::error::PreprocessError;
use crate::{Idx2d, Idx3d};
use ndarray::{Array2, Array3, ArrayView3, Axis};

/// 外部解码器交付的原始图像.
///
/// 浮点图像的像素应在 `[0, 1]` 内; 整数图像的像素在 `[0, 255]` 内.
#[derive(Clone, Debug)]
pub enum RawImage {
    /// 取值 `[0, 1]` 的浮点图像.
    Float(Array3<f32>),

    /// 取值 `[0, 255]` 的 8-bit 图像.
    Byte(Array3<u8>),
}

impl RawImage {
    /// 从单通道浮点数据构建.
    #[inline]
    pub fn from_gray_f32(data: Array2<f32>) -> Self {
        Self::Float(data.insert_axis(Axis(2)))
    }

    /// 从单通道 8-bit 数据构建.
    #[inline]
    pub fn from_gray_u8(data: Array2<u8>) -> Self {
        Self::Byte(data.insert_axis(Axis(2)))
    }

    /// 图像形状 (高, 宽, 通道).
    pub fn shape(&self) -> Idx3d {
        match self {
            Self::Float(a) => a.dim(),
            Self::Byte(a) => a.dim(),
        }
    }

    /// 图像平面形状 (高, 宽).
    #[inline]
    pub fn plane_shape(&self) -> Idx2d {
        let (h, w, _) = self.shape();
        (h, w)
    }

    /// 是否为浮点图像.
    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    /// 检查形状是否可被流水线处理.
    pub(crate) fn check_shape(&self) -> Result<(), PreprocessError> {
        check_shape(self.shape())
    }

    /// 将图像转换到 `[0, 1]` 浮点表示. 整数图像除以 255.
    pub(crate) fn to_unit_f32(&self) -> Array3<f32> {
        match self {
            Self::Float(a) => a.clone(),
            Self::Byte(a) => a.mapv(|v| v as f32 / crate::consts::U8_MAX_F32),
        }
    }
}

/// 检查形状: 非空且通道数为 1 或 3.
pub(crate) fn check_shape((h, w, c): Idx3d) -> Result<(), PreprocessError> {
    if h == 0 || w == 0 {
        return Err(PreprocessError::EmptyImage);
    }
    if c != 1 && c != 3 {
        return Err(PreprocessError::UnsupportedChannels(c));
    }
    Ok(())
}

/// 规范的 0-255 整数图像. 这是分割阶段唯一接受的输入.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ByteImage {
    data: Array3<u8>,
}

impl ByteImage {
    /// 直接从 8-bit 数据构建. 形状非法时返回 `Err`.
    pub fn new(data: Array3<u8>) -> Result<Self, PreprocessError> {
        check_shape(data.dim())?;
        Ok(Self { data })
    }

    /// 获得底层数据的不可变视图.
    #[inline]
    pub fn array_view(&self) -> ArrayView3<u8> {
        self.data.view()
    }

    /// 图像形状 (高, 宽, 通道).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 图像平面形状 (高, 宽).
    #[inline]
    pub fn plane_shape(&self) -> Idx2d {
        let (h, w, _) = self.shape();
        (h, w)
    }

    /// 通道数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.shape().2
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_check() {
        assert_eq!(
            ByteImage::new(Array3::zeros((0, 4, 3))).unwrap_err(),
            PreprocessError::EmptyImage
        );
        assert_eq!(
            ByteImage::new(Array3::zeros((2, 4, 2))).unwrap_err(),
            PreprocessError::UnsupportedChannels(2)
        );
        let img = ByteImage::new(Array3::from_shape_fn((2, 3, 3), |(h, w, c)| {
            (h * 9 + w * 3 + c) as u8
        }))
        .unwrap();
        assert_eq!(img.plane_shape(), (2, 3));
        assert_eq!(img.channels(), 3);
        assert_eq!(img.array_view()[(1, 2, 1)], 16);
    }

    #[test]
    fn test_gray_constructors() {
        let raw = RawImage::from_gray_u8(Array2::from_elem((4, 5), 200));
        assert_eq!(raw.shape(), (4, 5, 1));
        assert!(!raw.is_float());
        let unit = raw.to_unit_f32();
        assert!((unit[(3, 4, 0)] - 200.0 / 255.0).abs() < 1e-6);

        let raw = RawImage::from_gray_f32(Array2::from_elem((1, 2), 0.5));
        assert!(raw.is_float());
        assert_eq!(raw.plane_shape(), (1, 2));
    }
}
