//! 测量工具依赖的通用组件.

use std::io::{self, Write};

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: Write>(mut w: W) -> io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sep_to() {
        let mut buf = Vec::new();
        sep_to(&mut buf).unwrap();
        assert_eq!(buf, format!("{SEP}\n").into_bytes());
    }
}
