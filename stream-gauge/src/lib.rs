#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 从实验图像序列中分割流体射流 (stream), 并测量其物理宽度.
//!
//! 每张图像依次经过:
//!
//! 1. 强度归一化 / 明场校正 ([`preproc`]);
//! 2. 射流/背景两类无监督聚类与方向规范化 ([`segment`]);
//! 3. 8-连通区域提取, 取列跨度最大者为射流 ([`eight`]);
//! 4. 倾斜修正后的逐列宽度统计 ([`width`]).
//!
//! [`batch`] 将上述步骤串成流水线, 按输入顺序处理整个图像序列.
//!
//! # 注意
//!
//! 1. 本 crate 不安装任何 logger, 只通过 `log` 门面输出记录.
//! 2. 数据相关的失败一律以 `Result` 返回, 不会 panic.
//! 3. 聚类的随机性完全由 [`ClusterSpec::seed`] 决定, 相同输入总是得到相同结果.
//!
//! # 开发计划
//!
//! ### 归一化与明场校正 ✅
//!
//! 明场参考图在标定阶段校验并归一化一次, 批次内共享.
//!
//! 实现位于 `stream-gauge/src/preproc`.
//!
//! ### 两类 k-means 与背景方向规范化 ✅
//!
//! k-means++ 初始化, 多次重启取惯性最小者. 以首行为参照判定背景.
//!
//! 实现位于 `stream-gauge/src/segment`.
//!
//! ### 8-邻域连通区域提取 ✅
//!
//! 实现位于 `stream-gauge/src/eight`.
//!
//! ### 倾斜修正与宽度统计 ✅
//!
//! 实现位于 `stream-gauge/src/width.rs`.
//!
//! ### 批处理 ✅
//!
//! 1. 快速失败与跳过两种策略 ✅
//! 2. 协作式取消 ✅
//! 3. 基于 `rayon` 的保序并行 ✅
//! 4. 带列名的结果表 ✅
//!
//! 实现位于 `stream-gauge/src/batch`.
//!
//! ### 单应性透视校正 ⌛️
//!
//! 目前要求输入图像已被外部工具校正.

/// 二维索引 `(h, w)`.
pub type Idx2d = (usize, usize);

/// 三维索引 `(h, w, c)`.
pub type Idx3d = (usize, usize, usize);

type Area2d = Vec<Idx2d>;

pub mod consts;

pub mod error;

/// 图像与中间结果的基础数据结构.
mod data;

pub use data::{ByteImage, LabelGrid, RawImage, StreamMask};

pub mod preproc;

pub mod segment;

pub mod eight;

pub mod width;

pub mod calib;

pub mod source;

pub mod batch;

pub mod prelude;

pub use batch::{process_image, process_sequence, BatchResult, PipelineSpec};
pub use calib::Calibration;
pub use segment::ClusterSpec;
pub use width::WidthMeasurement;

#[cfg(feature = "rayon")]
pub use batch::process_sequence_par;
