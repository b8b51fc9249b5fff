//! 🌊欢迎光临💧
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{ByteImage, LabelGrid, RawImage, StreamMask};

pub use crate::consts::label::{BACKGROUND, STREAM};

pub use crate::error::{
    BatchError, CalibrationError, LoadError, MeasureError, PreprocessError, RegionError, Stage,
    StageError,
};

pub use crate::calib::{um_per_pixel_from_segment, Calibration};
pub use crate::preproc::Brightfield;
pub use crate::segment::{ClusterSpec, OrientMode};
pub use crate::source::{ImagePath, ImageSource, NpyPath};
pub use crate::width::WidthMeasurement;

pub use crate::batch::{
    process_image, process_sequence, BatchDriver, BatchEntry, BatchObserver, BatchResult,
    CancelFlag, FailurePolicy, LogObserver, PipelineSpec, Table,
};

#[cfg(feature = "rayon")]
pub use crate::batch::process_sequence_par;
