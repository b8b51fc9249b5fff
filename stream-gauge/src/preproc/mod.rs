//! 强度归一化与明场 (brightfield) 校正.
//!
//! 两条路径互斥: 提供了明场参考图时, 由 [`apply_brightfield`] 一步完成校正与归一化;
//! 否则由 [`normalize`] 单独完成归一化.

mod brightfield;

pub use brightfield::Brightfield;

use crate::data::{ByteImage, RawImage};
use crate::error::PreprocessError;
use ndarray::ArrayView3;

/// 将 `[0, 1]` 范围的浮点图像乘以 255 并截断为 8-bit 整数.
///
/// 8-bit 输入已是规范表示, 原样复制, 不会被再次放大.
///
/// # 错误
///
/// - 浮点像素不在 `[0, 1]` 内 (或不是有限值) 时返回 [`PreprocessError::OutOfRange`];
/// - 形状非法时返回 [`PreprocessError::EmptyImage`] 或
///   [`PreprocessError::UnsupportedChannels`].
pub fn normalize(image: &RawImage) -> Result<ByteImage, PreprocessError> {
    image.check_shape()?;
    match image {
        RawImage::Float(data) => normalize_unit(data.view()),
        RawImage::Byte(data) => ByteImage::new(data.clone()),
    }
}

/// 以明场参考图校正 `image` 并直接得到 8-bit 图像.
///
/// 校正后的最大值恰好映射为 255.
#[inline]
pub fn apply_brightfield(
    image: &RawImage,
    brightfield: &Brightfield,
) -> Result<ByteImage, PreprocessError> {
    brightfield.apply(image)
}

/// 按流水线规则选择预处理路径.
pub fn preprocess(
    image: &RawImage,
    brightfield: Option<&Brightfield>,
) -> Result<ByteImage, PreprocessError> {
    match brightfield {
        Some(bf) => apply_brightfield(image, bf),
        None => normalize(image),
    }
}

/// 任意浮点类型的 `[0, 1]` 图像到 8-bit 的截断转换.
pub fn normalize_unit<T: num::Float>(data: ArrayView3<T>) -> Result<ByteImage, PreprocessError> {
    crate::data::check_shape(data.dim())?;
    let (zero, one) = (T::zero(), T::one());
    if let Some(bad) = data
        .iter()
        .find(|v| !v.is_finite() || **v < zero || **v > one)
    {
        return Err(PreprocessError::OutOfRange(bad.to_f32().unwrap_or(f32::NAN)));
    }
    let Some(scale) = T::from(u8::MAX) else {
        unreachable!("浮点类型总能表示 255")
    };
    // 255 * 1.0 == 255, 不会溢出.
    let out = data.mapv(|v| (v * scale).to_u8().unwrap_or(u8::MAX));
    ByteImage::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_normalize_truncates() {
        let img = RawImage::Float(Array3::from_shape_vec(
            (1, 4, 1),
            vec![0.0_f32, 0.5, 0.999, 1.0],
        )
        .unwrap());
        let out = normalize(&img).unwrap().into_raw();
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![0, 127, 254, 255]);
    }

    #[test]
    fn test_normalize_rejects_prescaled() {
        let img = RawImage::from_gray_f32(Array2::from_elem((2, 2), 200.0));
        assert_eq!(normalize(&img).unwrap_err(), PreprocessError::OutOfRange(200.0));

        let img = RawImage::from_gray_f32(Array2::from_elem((2, 2), f32::NAN));
        assert!(matches!(normalize(&img), Err(PreprocessError::OutOfRange(_))));
    }

    #[test]
    fn test_normalize_byte_passthrough() {
        let img = RawImage::from_gray_u8(Array2::from_elem((2, 3), 17));
        let out = normalize(&img).unwrap();
        assert!(out.array_view().iter().all(|p| *p == 17));
    }

    #[test]
    fn test_normalize_f64() {
        let data = Array3::from_elem((2, 2, 3), 0.25_f64);
        let out = normalize_unit(data.view()).unwrap();
        assert!(out.array_view().iter().all(|p| *p == 63));
    }

    #[test]
    fn test_preprocess_path_selection() {
        let img = RawImage::from_gray_f32(Array2::from_elem((2, 2), 0.5));
        let bf = Brightfield::new(&RawImage::from_gray_f32(Array2::from_elem((2, 2), 0.5)))
            .unwrap();
        // 明场路径把最大值拉伸到 255, 普通路径只做截断.
        assert!(preprocess(&img, Some(&bf))
            .unwrap()
            .array_view()
            .iter()
            .all(|p| *p == 255));
        assert!(preprocess(&img, None)
            .unwrap()
            .array_view()
            .iter()
            .all(|p| *p == 127));
    }
}
