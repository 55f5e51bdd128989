use core::fmt::Display;

/// Smallest per-group input channel count routed to the [XZP GEMM](UKernelType::XzpGemm)
/// micro-kernel.
///
/// Set to the largest representable size: no real convolution reaches it, which keeps the XZP
/// path reserved.
pub const XZP_GEMM_MIN_GROUP_INPUT_CHANNELS: usize = usize::MAX;

/// The micro-kernel family used to run a convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UKernelType {
    /// No micro-kernel selected.
    None,
    /// Matrix multiplication, for 1x1 convolutions without stride or padding.
    Gemm,
    /// Matrix multiplication with precomputed input sums. Reserved.
    XzpGemm,
    /// Depthwise convolution, for 3x3 and 5x5 kernels with one channel per group.
    DwConv,
    /// General convolution, handles any stride, padding and dilation.
    Conv,
}

impl UKernelType {
    /// Short lower-case name of the micro-kernel.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gemm => "gemm",
            Self::XzpGemm => "xzp_gemm",
            Self::DwConv => "dwconv",
            Self::Conv => "conv",
        }
    }

    /// Selects the micro-kernel for the given shape.
    ///
    /// Rules are tried in order and the first one that matches wins:
    ///
    /// 1. transposed convolutions always use [Conv](Self::Conv);
    /// 2. kernels of 9 or 25 taps (3x3, 5x5) with a single input and output channel per group,
    ///    over more than one group, use [DwConv](Self::DwConv);
    /// 3. 1x1 kernels with unit stride and no padding use [Gemm](Self::Gemm), or
    ///    [XzpGemm](Self::XzpGemm) past [XZP_GEMM_MIN_GROUP_INPUT_CHANNELS];
    /// 4. everything else uses [Conv](Self::Conv).
    pub fn classify(shape: &UKernelShape) -> Self {
        RULES
            .iter()
            .find_map(|rule| rule(shape))
            .unwrap_or(Self::None)
    }
}

impl Display for UKernelType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// The static shape parameters micro-kernel selection depends on.
///
/// Pairs are `[width, height]` and padding is `[top, left, bottom, right]`.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UKernelShape {
    /// Whether the convolution is transposed.
    pub transpose: bool,
    /// Kernel dimensions.
    pub kernel_dims: [u32; 2],
    /// Subsampling dimensions.
    pub stride_dims: [u32; 2],
    /// Input padding.
    pub padding: [u32; 4],
    /// Number of groups.
    pub groups: u32,
    /// Input channels of a single group.
    pub group_input_channels: usize,
    /// Output channels of a single group.
    pub group_output_channels: usize,
}

impl UKernelShape {
    fn kernel_size(&self) -> u64 {
        self.kernel_dims[0] as u64 * self.kernel_dims[1] as u64
    }

    /// Whether any side of the input is padded.
    pub fn has_padding(&self) -> bool {
        self.padding.iter().any(|pad| *pad != 0)
    }

    /// Whether each of several groups maps a single input channel to a single output channel.
    pub fn is_depthwise(&self) -> bool {
        self.groups > 1 && self.group_input_channels == 1 && self.group_output_channels == 1
    }
}

type Rule = fn(&UKernelShape) -> Option<UKernelType>;

const RULES: [Rule; 4] = [transposed, depthwise, pointwise, general];

fn transposed(shape: &UKernelShape) -> Option<UKernelType> {
    shape.transpose.then_some(UKernelType::Conv)
}

fn depthwise(shape: &UKernelShape) -> Option<UKernelType> {
    let matches = matches!(shape.kernel_size(), 9 | 25) && shape.is_depthwise();

    matches.then_some(UKernelType::DwConv)
}

fn pointwise(shape: &UKernelShape) -> Option<UKernelType> {
    if shape.kernel_size() != 1 || shape.stride_dims != [1, 1] || shape.has_padding() {
        return None;
    }

    if shape.group_input_channels >= XZP_GEMM_MIN_GROUP_INPUT_CHANNELS {
        Some(UKernelType::XzpGemm)
    } else {
        Some(UKernelType::Gemm)
    }
}

fn general(_shape: &UKernelShape) -> Option<UKernelType> {
    Some(UKernelType::Conv)
}
