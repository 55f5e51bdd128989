use alloc::string::String;

use crate::{Axis, ConvKind};

/// Invalid convolution configuration.
///
/// Every variant names the operation being created so that the message matches the diagnostic
/// reported through the [sink](crate::DiagnosticSink).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The number of groups is zero.
    #[error("failed to create {kind} with groups equal to zero")]
    InvalidGroups {
        /// Operation being created.
        kind: ConvKind,
    },

    /// The input or output channel count is not a multiple of the number of groups.
    #[error(
        "failed to create {kind}: input ({input_channels}) and output ({output_channels}) channels must be divisible by groups ({groups})"
    )]
    ChannelsNotDivisibleByGroups {
        /// Operation being created.
        kind: ConvKind,
        /// Number of groups.
        groups: u32,
        /// Total input channels.
        input_channels: usize,
        /// Total output channels.
        output_channels: usize,
    },

    /// A kernel dimension is zero.
    #[error(
        "failed to create {kind} with {width}x{height} kernel: kernel dimensions must be non-zero"
    )]
    InvalidKernelShape {
        /// Operation being created.
        kind: ConvKind,
        /// Kernel width.
        width: u32,
        /// Kernel height.
        height: u32,
    },

    /// A stride (subsampling) dimension is zero.
    #[error(
        "failed to create {kind} with {width}x{height} subsampling: subsampling dimensions must be non-zero"
    )]
    InvalidStride {
        /// Operation being created.
        kind: ConvKind,
        /// Width subsampling.
        width: u32,
        /// Height subsampling.
        height: u32,
    },

    /// A dilation dimension is zero.
    #[error(
        "failed to create {kind} with {width}x{height} dilation: dilation dimensions must be non-zero"
    )]
    InvalidDilation {
        /// Operation being created.
        kind: ConvKind,
        /// Width dilation.
        width: u32,
        /// Height dilation.
        height: u32,
    },

    /// The kernel scale is zero, negative, subnormal, infinite or NaN.
    #[error("failed to create {kind} with {scale} kernel scale: scale must be finite and positive")]
    InvalidScale {
        /// Operation being created.
        kind: ConvKind,
        /// Offending scale.
        scale: f32,
    },
}

impl ConfigError {
    /// The operation that failed to be created.
    pub fn kind(&self) -> ConvKind {
        match self {
            Self::InvalidGroups { kind }
            | Self::ChannelsNotDivisibleByGroups { kind, .. }
            | Self::InvalidKernelShape { kind, .. }
            | Self::InvalidStride { kind, .. }
            | Self::InvalidDilation { kind, .. }
            | Self::InvalidScale { kind, .. } => *kind,
        }
    }
}

/// Error raised when an input shape can't be mapped to an output shape.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The output extent along an axis would be negative.
    #[error(
        "{kind} {axis} underflows: input size {input_dim} with {pad_dim} total padding and effective kernel size {effective_kernel}"
    )]
    OutputDimensionUnderflow {
        /// Operation the shape was computed for.
        kind: ConvKind,
        /// Axis that underflows.
        axis: Axis,
        /// Input extent along the axis.
        input_dim: usize,
        /// Sum of the two paddings of the axis.
        pad_dim: usize,
        /// Kernel extent once dilated.
        effective_kernel: usize,
    },
}

/// Configuration IO error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigIoError {
    /// Invalid format.
    #[error("Config error => Invalid format: {0}")]
    InvalidFormat(String),

    /// File not found.
    #[error("Config error => File not found: {0}")]
    FileNotFound(String),
}
