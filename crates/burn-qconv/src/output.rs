use core::fmt::Display;

/// A spatial axis of a 2D convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal axis, index 0 of spatial pairs.
    Width,
    /// Vertical axis, index 1 of spatial pairs.
    Height,
}

impl Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Width => f.write_str("width"),
            Self::Height => f.write_str("height"),
        }
    }
}

/// Kernel extent once dilation is applied.
///
/// ```text
/// effective_kernel = (kernel_dim - 1) * dilation_dim + 1
/// ```
pub fn effective_kernel_dimension(kernel_dim: usize, dilation_dim: usize) -> usize {
    (kernel_dim - 1) * dilation_dim + 1
}

/// Predict the output size of a convolution along one axis.
///
/// ```text
/// transpose:     out = stride * (in - 1) + adjustment + effective_kernel - pad
/// non-transpose: out = (in + pad - effective_kernel) / stride + 1
/// ```
///
/// # Arguments
///
/// - `input_dim`: The input size.
/// - `pad_dim`: The sum of the paddings at both ends of the axis.
/// - `adjustment_dim`: Extra output size, only used by transposed convolutions.
/// - `kernel_dim`: The kernel size, must be > 0.
/// - `dilation_dim`: The dilation, must be > 0.
/// - `stride_dim`: The stride, must be > 0.
/// - `transpose`: Whether the convolution is transposed.
///
/// # Panics
///
/// In debug builds, if the output size would be negative. For a regular convolution this
/// happens when `input_dim + pad_dim` is smaller than the effective kernel size. A transposed
/// convolution needs `input_dim >= 1`, and `pad_dim` must not exceed
/// `stride_dim * (input_dim - 1) + adjustment_dim + effective_kernel`. See
/// [try_compute_output_dimension] for the checked variant.
pub fn compute_output_dimension(
    input_dim: usize,
    pad_dim: usize,
    adjustment_dim: usize,
    kernel_dim: usize,
    dilation_dim: usize,
    stride_dim: usize,
    transpose: bool,
) -> usize {
    let kernel_dim = effective_kernel_dimension(kernel_dim, dilation_dim);

    if transpose {
        stride_dim * (input_dim - 1) + adjustment_dim + kernel_dim - pad_dim
    } else {
        (input_dim + pad_dim - kernel_dim) / stride_dim + 1
    }
}

/// Predict the output size of a convolution along one axis.
///
/// This is the checked variant of [compute_output_dimension]: it returns `None` when the output
/// size would be negative or doesn't fit in a `usize`.
pub fn try_compute_output_dimension(
    input_dim: usize,
    pad_dim: usize,
    adjustment_dim: usize,
    kernel_dim: usize,
    dilation_dim: usize,
    stride_dim: usize,
    transpose: bool,
) -> Option<usize> {
    let kernel_dim = kernel_dim
        .checked_sub(1)?
        .checked_mul(dilation_dim)?
        .checked_add(1)?;

    if transpose {
        stride_dim
            .checked_mul(input_dim.checked_sub(1)?)?
            .checked_add(adjustment_dim)?
            .checked_add(kernel_dim)?
            .checked_sub(pad_dim)
    } else {
        input_dim
            .checked_add(pad_dim)?
            .checked_sub(kernel_dim)?
            .checked_div(stride_dim)?
            .checked_add(1)
    }
}
