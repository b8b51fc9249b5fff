//! 对 `stream-gauge` 的更一层封装. 从环境变量读取配置, 并列出待测图像.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use stream_gauge::error::{CalibrationError, LoadError};
use stream_gauge::prelude::*;
use thiserror::Error;

/// 配置错误.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的环境变量未设置.
    #[error("environment variable `{0}` is required")]
    Missing(&'static str),

    /// 环境变量无法解析.
    #[error("environment variable `{var}` has invalid value '{value}'")]
    Invalid {
        /// 变量名.
        var: &'static str,
        /// 原始值.
        value: String,
    },

    /// 无法确定家目录.
    #[error("cannot locate the home directory")]
    NoHome,

    /// 列目录失败.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// 标定参数无效.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// 明场参考图加载失败.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// 图像序列目录的环境变量.
pub const IMAGE_DIR_VAR: &str = "STREAM_IMAGE_DIR";

/// 像素标定常数的环境变量.
pub const UM_PER_PIXEL_VAR: &str = "STREAM_UM_PER_PIXEL";

/// 明场参考图路径的环境变量.
pub const BRIGHTFIELD_VAR: &str = "STREAM_BRIGHTFIELD";

/// 聚类随机种子的环境变量.
pub const SEED_VAR: &str = "STREAM_SEED";

/// 返回 `$HOME/dataset/<it>`.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 获取图像序列目录.
///
/// 1. 若环境变量 `$STREAM_IMAGE_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/stream`.
pub fn image_dir_from_env_or_home() -> Result<PathBuf, ConfigError> {
    match env::var(IMAGE_DIR_VAR) {
        Ok(d) if !d.is_empty() => Ok(PathBuf::from(d)),
        _ => home_dataset_dir_with(["stream"]).ok_or(ConfigError::NoHome),
    }
}

/// 列出 `dir` 下文件名以 `prefix` 开头, 扩展名为 `extension` 的文件, 按文件名排序.
///
/// `extension` 不含点号, 比较时不区分大小写.
pub fn image_paths<P: AsRef<Path>>(
    dir: P,
    prefix: &str,
    extension: &str,
) -> io::Result<Vec<PathBuf>> {
    let mut ans = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name_ok = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(prefix));
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if name_ok && ext_ok {
            ans.push(path);
        }
    }
    ans.sort();
    Ok(ans)
}

/// 根据扩展名选择图像来源: `.npy` 使用 [`NpyPath`], 其余使用 [`ImagePath`].
pub fn source_for<P: AsRef<Path>>(path: P) -> Box<dyn ImageSource + Send + Sync> {
    let path = path.as_ref();
    let is_npy = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("npy"));
    if is_npy {
        Box::new(NpyPath::new(path))
    } else {
        Box::new(ImagePath::new(path))
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    let Ok(value) = env::var(var) else {
        return Ok(None);
    };
    if value.trim().is_empty() {
        return Ok(None);
    }
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(ConfigError::Invalid { var, value }),
    }
}

/// 从 `$STREAM_UM_PER_PIXEL` 读取像素标定常数. 必需.
pub fn um_per_pixel_from_env() -> Result<f64, ConfigError> {
    parse_var(UM_PER_PIXEL_VAR)?.ok_or(ConfigError::Missing(UM_PER_PIXEL_VAR))
}

/// 从 `$STREAM_SEED` 读取聚类随机种子. 可选.
pub fn seed_from_env() -> Result<Option<u64>, ConfigError> {
    parse_var(SEED_VAR)
}

/// 从 `$STREAM_BRIGHTFIELD` 读取明场参考图路径. 可选.
pub fn brightfield_from_env() -> Option<PathBuf> {
    env::var_os(BRIGHTFIELD_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// 由环境变量构建标定参数.
pub fn calibration_from_env() -> Result<Calibration, ConfigError> {
    let calib = Calibration::new(um_per_pixel_from_env()?)?;
    match brightfield_from_env() {
        Some(p) => {
            log::info!("loader | brightfield reference: {}", p.display());
            let raw = source_for(&p).load()?;
            Ok(calib.with_brightfield(&raw)?)
        }
        None => Ok(calib),
    }
}

/// 由环境变量构建流水线配置. 未设置的项取默认值.
pub fn pipeline_spec_from_env() -> Result<PipelineSpec, ConfigError> {
    let mut spec = PipelineSpec::default();
    if let Some(seed) = seed_from_env()? {
        spec.cluster = ClusterSpec::with_seed(seed);
    }
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_paths_filter_and_sort() {
        let mut dir = env::temp_dir();
        dir.push(format!("stream-utils-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["frame_002.png", "frame_001.PNG", "frame_003.npy", "other_001.png"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let got = image_paths(&dir, "frame_", "png").unwrap();
        let names: Vec<_> = got
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["frame_001.PNG", "frame_002.png"]);

        assert_eq!(image_paths(&dir, "", "npy").unwrap().len(), 1);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_source_for_extension() {
        assert!(source_for("a/b.NPY").describe().ends_with("b.NPY"));
        assert!(matches!(
            source_for("nope.npy").load(),
            Err(LoadError::Npy { .. })
        ));
        assert!(matches!(
            source_for("nope.png").load(),
            Err(LoadError::Io { .. })
        ));
    }
}
