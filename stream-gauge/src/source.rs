//! 图像来源.
//!
//! 流水线本身不关心图像如何存储, 只通过 [`ImageSource`] 取得解码后的像素网格.

use crate::data::RawImage;
use crate::error::LoadError;
use ndarray::{Array2, Array3};
use ndarray_npy::{read_npy, ReadNpyError};
use std::path::{Path, PathBuf};

/// 可被解码为 [`RawImage`] 的图像定位符.
pub trait ImageSource {
    /// 用于日志和错误信息的简短描述.
    fn describe(&self) -> String;

    /// 加载并解码图像.
    fn load(&self) -> Result<RawImage, LoadError>;
}

/// 内存中的图像. 每次加载都会复制一份, 原图不受流水线影响.
impl ImageSource for RawImage {
    fn describe(&self) -> String {
        format!("in-memory {:?}", self.shape())
    }

    #[inline]
    fn load(&self) -> Result<RawImage, LoadError> {
        Ok(self.clone())
    }
}

/// 由 `image` 解码的普通栅格图像文件 (png, tiff, jpeg, bmp 等).
///
/// 灰度图像得到单通道, 其余一律转换为 RGB 三通道. 16-bit 数据会被压缩到 8-bit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePath(pub PathBuf);

impl ImagePath {
    /// 初始化.
    #[inline]
    pub fn new<P: AsRef<Path>>(p: P) -> Self {
        Self(p.as_ref().to_owned())
    }
}

impl ImageSource for ImagePath {
    fn describe(&self) -> String {
        self.0.display().to_string()
    }

    fn load(&self) -> Result<RawImage, LoadError> {
        let path = self.0.as_path();
        std::fs::metadata(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        let img = image::open(path).map_err(|source| LoadError::Image {
            path: path.to_owned(),
            source,
        })?;

        let (w, h) = (img.width() as usize, img.height() as usize);
        let (c, buf) = if img.color().has_color() {
            (3, img.to_rgb8().into_raw())
        } else {
            (1, img.to_luma8().into_raw())
        };
        Array3::from_shape_vec((h, w, c), buf)
            .map(RawImage::Byte)
            .map_err(|e| LoadError::Shape(e.to_string()))
    }
}

/// `.npy` 数组文件.
///
/// 依次尝试 `f32` 三维, `f32` 二维, `u8` 三维, `u8` 二维数组. 二维数组视为单通道图像.
/// `f32` 数据按 `[0, 1]` 浮点图像解释.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpyPath(pub PathBuf);

impl NpyPath {
    /// 初始化.
    #[inline]
    pub fn new<P: AsRef<Path>>(p: P) -> Self {
        Self(p.as_ref().to_owned())
    }
}

impl ImageSource for NpyPath {
    fn describe(&self) -> String {
        self.0.display().to_string()
    }

    fn load(&self) -> Result<RawImage, LoadError> {
        read_any_npy(&self.0).map_err(|source| LoadError::Npy {
            path: self.0.clone(),
            source,
        })
    }
}

fn read_any_npy(path: &Path) -> Result<RawImage, ReadNpyError> {
    if let Ok(a) = read_npy::<_, Array3<f32>>(path) {
        return Ok(RawImage::Float(a));
    }
    if let Ok(a) = read_npy::<_, Array2<f32>>(path) {
        return Ok(RawImage::from_gray_f32(a));
    }
    if let Ok(a) = read_npy::<_, Array3<u8>>(path) {
        return Ok(RawImage::Byte(a));
    }
    read_npy::<_, Array2<u8>>(path).map(RawImage::from_gray_u8)
}

/// 引用同样是图像来源.
impl<T: ImageSource + ?Sized> ImageSource for &T {
    #[inline]
    fn describe(&self) -> String {
        (**self).describe()
    }

    #[inline]
    fn load(&self) -> Result<RawImage, LoadError> {
        (**self).load()
    }
}

/// 装箱的图像来源, 便于混合不同类型.
impl ImageSource for Box<dyn ImageSource + Send + Sync> {
    #[inline]
    fn describe(&self) -> String {
        (**self).describe()
    }

    #[inline]
    fn load(&self) -> Result<RawImage, LoadError> {
        (**self).load()
    }
}
