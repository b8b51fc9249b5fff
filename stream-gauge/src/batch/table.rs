//! 带列名的结果表.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 每条结果的字段个数: 平均宽度, 宽度标准差.
pub const TABLE_ARITY: usize = 2;

/// 由 [`BatchResult::to_table`](super::BatchResult::to_table) 生成的两列结果表.
///
/// 每行带有图像在输入序列中的索引. 列名只做展示用途, 不做任何校验.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: [String; TABLE_ARITY],
    rows: Vec<(usize, [f64; TABLE_ARITY])>,
}

impl Table {
    pub(crate) fn new(columns: [String; TABLE_ARITY], rows: Vec<(usize, [f64; TABLE_ARITY])>) -> Self {
        Self { columns, rows }
    }

    /// 列名.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 全部行, 形如 `(输入索引, [字段 0, 字段 1])`.
    #[inline]
    pub fn rows(&self) -> &[(usize, [f64; TABLE_ARITY])] {
        &self.rows
    }

    /// 行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否没有任何行.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for Table {
    /// 对齐的纯文本表格.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const S4: &str = "    ";

        let width = self
            .columns
            .iter()
            .map(|c| c.chars().count())
            .max()
            .unwrap_or(0)
            .max(12);

        write!(f, "{:>5}", "index")?;
        for c in self.columns.iter() {
            write!(f, "{S4}{c:>width$}")?;
        }
        for (index, [a, b]) in self.rows.iter() {
            writeln!(f)?;
            write!(f, "{index:>5}{S4}{a:>width$.6}{S4}{b:>width$.6}")?;
        }
        Ok(())
    }
}
