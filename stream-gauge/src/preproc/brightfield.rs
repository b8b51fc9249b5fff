use crate::data::{ByteImage, RawImage};
use crate::error::PreprocessError;
use crate::Idx3d;
use ndarray::Array3;

/// 明场参考图. 构建时即完成校验与 `[0, 1]` 归一化, 之后只读.
///
/// 一个批次只构建一次, 由所有图像共享.
#[derive(Clone, Debug)]
pub struct Brightfield {
    /// 除以最大值后的参考场, 每个像素都是 `(0, 1]` 内的有限值.
    unit: Array3<f32>,
}

impl Brightfield {
    /// 从原始参考图构建.
    ///
    /// 参考图含非有限值、全零或含零像素 (会导致除零) 时返回
    /// [`PreprocessError::InvalidBrightfield`].
    pub fn new(raw: &RawImage) -> Result<Self, PreprocessError> {
        raw.check_shape()?;
        let mut unit = raw.to_unit_f32();
        if unit.iter().any(|v| !v.is_finite()) {
            return Err(PreprocessError::InvalidBrightfield("non-finite pixel"));
        }
        let max = unit.iter().copied().fold(0.0_f32, f32::max);
        if max <= 0.0 {
            return Err(PreprocessError::InvalidBrightfield("all-zero reference"));
        }
        unit.mapv_inplace(|v| v / max);
        if unit.iter().any(|v| *v <= 0.0) {
            return Err(PreprocessError::InvalidBrightfield("zero pixel in reference"));
        }
        Ok(Self { unit })
    }

    /// 参考图形状 (高, 宽, 通道).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.unit.dim()
    }

    /// 逐点除以参考场, 再线性拉伸使最大值恰为 255.
    ///
    /// 浮点输入同样要求位于 `[0, 1]`. 全黑图像校正后仍为全黑.
    pub fn apply(&self, image: &RawImage) -> Result<ByteImage, PreprocessError> {
        image.check_shape()?;
        if image.shape() != self.shape() {
            return Err(PreprocessError::ShapeMismatch(image.shape(), self.shape()));
        }
        if let RawImage::Float(data) = image {
            if let Some(bad) = data
                .iter()
                .find(|v| !v.is_finite() || !(0.0..=1.0).contains(*v))
            {
                return Err(PreprocessError::OutOfRange(*bad));
            }
        }

        let mut corrected = image.to_unit_f32();
        corrected /= &self.unit;

        let max = corrected.iter().copied().fold(0.0_f32, f32::max);
        log::trace!("brightfield.apply | corrected max: {max}");

        let out = if max > 0.0 {
            // v == max 时 v / max 恰为 1.0.
            corrected.mapv(|v| ((v / max) * crate::consts::U8_MAX_F32) as u8)
        } else {
            Array3::zeros(corrected.dim())
        };
        ByteImage::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_all_zero_reference_rejected() {
        let raw = RawImage::from_gray_f32(Array2::zeros((3, 3)));
        assert!(matches!(
            Brightfield::new(&raw),
            Err(PreprocessError::InvalidBrightfield(_))
        ));
        let raw = RawImage::from_gray_u8(Array2::zeros((3, 3)));
        assert!(matches!(
            Brightfield::new(&raw),
            Err(PreprocessError::InvalidBrightfield(_))
        ));
    }

    #[test]
    fn test_partial_zero_and_nan_rejected() {
        let mut data = Array2::from_elem((2, 2), 0.8_f32);
        data[(1, 0)] = 0.0;
        assert!(Brightfield::new(&RawImage::from_gray_f32(data.clone())).is_err());
        data[(1, 0)] = f32::INFINITY;
        assert!(Brightfield::new(&RawImage::from_gray_f32(data)).is_err());
    }

    #[test]
    fn test_uneven_illumination_flattened() {
        // 左暗右亮的照明场, 样本本身是均匀的.
        let field = Array2::from_shape_fn((2, 4), |(_, w)| 0.25 * (w + 1) as f32);
        let sample = field.mapv(|v| v * 0.6);
        let bf = Brightfield::new(&RawImage::from_gray_f32(field)).unwrap();
        let out = bf.apply(&RawImage::from_gray_f32(sample)).unwrap();
        assert!(out.array_view().iter().all(|p| *p >= 254));
        assert!(out.array_view().iter().any(|p| *p == 255));
    }

    #[test]
    fn test_max_maps_to_255() {
        let bf = Brightfield::new(&RawImage::Byte(Array3::from_elem((2, 2, 3), 255))).unwrap();
        let img = Array3::from_shape_fn((2, 2, 3), |(h, w, c)| (10 * (h + w + c)) as u8);
        let out = bf.apply(&RawImage::Byte(img)).unwrap().into_raw();
        assert_eq!(out[(1, 1, 2)], 255);
        assert_eq!(out[(0, 0, 0)], 0);
        assert_eq!(out[(1, 0, 0)], (0.25_f32 * 255.0) as u8);
    }

    #[test]
    fn test_shape_mismatch() {
        let bf = Brightfield::new(&RawImage::from_gray_u8(Array2::from_elem((2, 2), 9))).unwrap();
        let err = bf
            .apply(&RawImage::from_gray_u8(Array2::from_elem((2, 3), 9)))
            .unwrap_err();
        assert_eq!(err, PreprocessError::ShapeMismatch((2, 3, 1), (2, 2, 1)));
    }

    #[test]
    fn test_black_image_stays_black() {
        let bf = Brightfield::new(&RawImage::from_gray_u8(Array2::from_elem((2, 2), 9))).unwrap();
        let out = bf
            .apply(&RawImage::from_gray_u8(Array2::zeros((2, 2))))
            .unwrap();
        assert!(out.array_view().iter().all(|p| *p == 0));
    }
}
