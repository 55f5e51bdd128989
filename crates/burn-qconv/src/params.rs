use core::fmt::Display;

use crate::{
    Axis, ConfigError, ConvParamsConfig, Diagnostic, DiagnosticSink, Inefficiency, LogSink,
    ShapeError, UKernelShape, UKernelType, compute_output_dimension, effective_kernel_dimension,
    try_compute_output_dimension,
};

/// The operation described by [convolution parameters](ConvParams).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvKind {
    /// Regular convolution.
    Convolution,
    /// Transposed convolution.
    Deconvolution,
}

impl ConvKind {
    /// The kind matching the `transpose` flag.
    pub fn from_transpose(transpose: bool) -> Self {
        if transpose {
            Self::Deconvolution
        } else {
            Self::Convolution
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Convolution => "convolution",
            Self::Deconvolution => "deconvolution",
        }
    }
}

impl Display for ConvKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated parameters of a quantized 2D convolution or transposed convolution.
///
/// Should be created with [ConvParamsConfig](ConvParamsConfig). Spatial pairs are
/// `[width, height]` and padding is `[top, left, bottom, right]`.
///
/// The parameters never change once built, so a single instance can be shared between threads
/// running inference on different input shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvParams {
    kernel_dims: [u32; 2],
    stride_dims: [u32; 2],
    dilation: [u32; 2],
    padding: [u32; 4],
    adjustment_dims: [u32; 2],
    groups: u32,
    input_channels: usize,
    output_channels: usize,
    kernel_zero_point: u8,
    kernel_scale: f32,
    output_min: u8,
    output_max: u8,
    transpose: bool,
    group_input_channels: usize,
    group_output_channels: usize,
    ukernel_type: UKernelType,
}

impl ConvParams {
    /// Validates the configuration and derives the parameters, reporting diagnostics through the
    /// [log] facade.
    pub fn new(config: &ConvParamsConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, &LogSink)
    }

    /// Validates the configuration and derives the parameters.
    ///
    /// A rejected configuration is reported to `sink` as an [error](crate::Severity::Error)
    /// before the error is returned. Valid but wasteful geometries are reported as
    /// [info](crate::Severity::Info) and don't change the result.
    pub fn with_sink(
        config: &ConvParamsConfig,
        sink: &dyn DiagnosticSink,
    ) -> Result<Self, ConfigError> {
        let params = Self::validate(config).inspect_err(|err| {
            sink.emit(Diagnostic::error(err));
        })?;

        for inefficiency in Inefficiency::detect(
            params.kind(),
            params.kernel_dims,
            params.stride_dims,
            params.padding,
        ) {
            sink.emit(Diagnostic::info(inefficiency));
        }

        Ok(params)
    }

    fn validate(config: &ConvParamsConfig) -> Result<Self, ConfigError> {
        let kind = ConvKind::from_transpose(config.transpose);
        let groups = config.groups;

        if groups == 0 {
            return Err(ConfigError::InvalidGroups { kind });
        }

        let groups_usize = groups as usize;
        if config.input_channels % groups_usize != 0 || config.output_channels % groups_usize != 0
        {
            return Err(ConfigError::ChannelsNotDivisibleByGroups {
                kind,
                groups,
                input_channels: config.input_channels,
                output_channels: config.output_channels,
            });
        }

        let [width, height] = config.kernel_dims;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidKernelShape {
                kind,
                width,
                height,
            });
        }

        let [width, height] = config.stride_dims;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidStride {
                kind,
                width,
                height,
            });
        }

        let [width, height] = config.dilation;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDilation {
                kind,
                width,
                height,
            });
        }

        let scale = config.kernel_scale;
        if scale <= 0.0 || !scale.is_normal() {
            return Err(ConfigError::InvalidScale { kind, scale });
        }

        let group_input_channels = config.input_channels / groups_usize;
        let group_output_channels = config.output_channels / groups_usize;

        let ukernel_type = UKernelType::classify(&UKernelShape::new(
            config.transpose,
            config.kernel_dims,
            config.stride_dims,
            config.padding,
            groups,
            group_input_channels,
            group_output_channels,
        ));

        Ok(Self {
            kernel_dims: config.kernel_dims,
            stride_dims: config.stride_dims,
            dilation: config.dilation,
            padding: config.padding,
            adjustment_dims: config.adjustment_dims,
            groups,
            input_channels: config.input_channels,
            output_channels: config.output_channels,
            kernel_zero_point: config.kernel_zero_point,
            kernel_scale: scale,
            output_min: config.output_min,
            output_max: config.output_max,
            transpose: config.transpose,
            group_input_channels,
            group_output_channels,
            ukernel_type,
        })
    }

    /// Computes the output dimensions `[width, height]` given the input dimensions
    /// `[width, height]`.
    ///
    /// # Panics
    ///
    /// In debug builds, if an output dimension would be negative. This includes empty inputs of
    /// transposed convolutions and transposed paddings larger than the upsampled extent. Use
    /// [try_compute_output_dims](Self::try_compute_output_dims) when the input isn't known to be
    /// large enough.
    pub fn compute_output_dims(&self, input_dims: [usize; 2]) -> [usize; 2] {
        [Axis::Width, Axis::Height].map(|axis| {
            let (pad_dim, adjustment_dim, kernel_dim, dilation_dim, stride_dim) =
                self.axis_geometry(axis);
            compute_output_dimension(
                input_dims[axis_index(axis)],
                pad_dim,
                adjustment_dim,
                kernel_dim,
                dilation_dim,
                stride_dim,
                self.transpose,
            )
        })
    }

    /// Computes the output dimensions `[width, height]` given the input dimensions
    /// `[width, height]`, failing instead of underflowing.
    pub fn try_compute_output_dims(
        &self,
        input_dims: [usize; 2],
    ) -> Result<[usize; 2], ShapeError> {
        let width = self.try_compute_output_dim(Axis::Width, input_dims[0])?;
        let height = self.try_compute_output_dim(Axis::Height, input_dims[1])?;

        Ok([width, height])
    }

    fn try_compute_output_dim(&self, axis: Axis, input_dim: usize) -> Result<usize, ShapeError> {
        let (pad_dim, adjustment_dim, kernel_dim, dilation_dim, stride_dim) =
            self.axis_geometry(axis);

        try_compute_output_dimension(
            input_dim,
            pad_dim,
            adjustment_dim,
            kernel_dim,
            dilation_dim,
            stride_dim,
            self.transpose,
        )
        .ok_or_else(|| ShapeError::OutputDimensionUnderflow {
            kind: self.kind(),
            axis,
            input_dim,
            pad_dim,
            effective_kernel: effective_kernel_dimension(kernel_dim, dilation_dim),
        })
    }

    /// Returns (total padding, adjustment, kernel, dilation, stride) along the axis.
    fn axis_geometry(&self, axis: Axis) -> (usize, usize, usize, usize, usize) {
        let index = axis_index(axis);
        let [top, left, bottom, right] = self.padding.map(|pad| pad as usize);
        let pad_dim = match axis {
            Axis::Width => left + right,
            Axis::Height => top + bottom,
        };

        (
            pad_dim,
            self.adjustment_dims[index] as usize,
            self.kernel_dims[index] as usize,
            self.dilation[index] as usize,
            self.stride_dims[index] as usize,
        )
    }

    /// The operation these parameters describe.
    pub fn kind(&self) -> ConvKind {
        ConvKind::from_transpose(self.transpose)
    }

    /// Kernel dimensions `[width, height]`.
    pub fn kernel_dims(&self) -> [u32; 2] {
        self.kernel_dims
    }

    /// Subsampling dimensions `[width, height]`.
    pub fn stride_dims(&self) -> [u32; 2] {
        self.stride_dims
    }

    /// Dilation `[width, height]`.
    pub fn dilation(&self) -> [u32; 2] {
        self.dilation
    }

    /// Input padding `[top, left, bottom, right]`.
    pub fn padding(&self) -> [u32; 4] {
        self.padding
    }

    /// Output adjustment `[width, height]` of transposed convolutions.
    pub fn adjustment_dims(&self) -> [u32; 2] {
        self.adjustment_dims
    }

    /// Number of groups.
    pub fn groups(&self) -> u32 {
        self.groups
    }

    /// Total input channels.
    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Total output channels.
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Input channels of a single group.
    pub fn group_input_channels(&self) -> usize {
        self.group_input_channels
    }

    /// Output channels of a single group.
    pub fn group_output_channels(&self) -> usize {
        self.group_output_channels
    }

    /// Zero point of the quantized weights.
    pub fn kernel_zero_point(&self) -> u8 {
        self.kernel_zero_point
    }

    /// Scale of the quantized weights.
    pub fn kernel_scale(&self) -> f32 {
        self.kernel_scale
    }

    /// Lower clamp bound of the quantized output.
    pub fn output_min(&self) -> u8 {
        self.output_min
    }

    /// Upper clamp bound of the quantized output.
    pub fn output_max(&self) -> u8 {
        self.output_max
    }

    /// Whether the convolution is transposed.
    pub fn transpose(&self) -> bool {
        self.transpose
    }

    /// The micro-kernel selected to run the convolution.
    pub fn ukernel_type(&self) -> UKernelType {
        self.ukernel_type
    }

    /// Number of kernel taps, `width * height`.
    pub fn kernel_size(&self) -> usize {
        self.kernel_dims[0] as usize * self.kernel_dims[1] as usize
    }

    /// Kernel dimensions `[width, height]` once dilated.
    pub fn effective_kernel_dims(&self) -> [usize; 2] {
        [0, 1].map(|index| {
            effective_kernel_dimension(
                self.kernel_dims[index] as usize,
                self.dilation[index] as usize,
            )
        })
    }

    /// Whether any side of the input is padded.
    pub fn has_padding(&self) -> bool {
        self.ukernel_shape().has_padding()
    }

    /// Whether each group maps a single input channel to a single output channel.
    pub fn is_depthwise(&self) -> bool {
        self.ukernel_shape().is_depthwise()
    }

    /// The shape the micro-kernel was selected from.
    pub fn ukernel_shape(&self) -> UKernelShape {
        UKernelShape::new(
            self.transpose,
            self.kernel_dims,
            self.stride_dims,
            self.padding,
            self.groups,
            self.group_input_channels,
            self.group_output_channels,
        )
    }

    /// The configuration reproducing these parameters.
    pub fn config(&self) -> ConvParamsConfig {
        ConvParamsConfig::builder(self.kernel_dims, self.input_channels, self.output_channels)
            .stride_dims(self.stride_dims)
            .dilation(self.dilation)
            .padding(self.padding)
            .adjustment_dims(self.adjustment_dims)
            .groups(self.groups)
            .kernel_zero_point(self.kernel_zero_point)
            .kernel_scale(self.kernel_scale)
            .output_min(self.output_min)
            .output_max(self.output_max)
            .transpose(self.transpose)
            .build()
    }
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::Width => 0,
        Axis::Height => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConvParamsConfigBuilder, MemorySink, Severity};
    use rstest::rstest;

    fn config(kernel_dims: [u32; 2], channels: usize) -> ConvParamsConfigBuilder {
        ConvParamsConfig::builder(kernel_dims, channels, channels)
    }

    #[test]
    fn derives_group_channels() {
        let params = ConvParamsConfig::builder([3, 3], 12, 24)
            .groups(3)
            .build()
            .init()
            .unwrap();

        assert_eq!(params.group_input_channels(), 4);
        assert_eq!(params.group_output_channels(), 8);
        assert_eq!(params.group_input_channels() * 3, params.input_channels());
        assert_eq!(params.group_output_channels() * 3, params.output_channels());
    }

    #[test]
    fn zero_groups_is_invalid() {
        let err = config([3, 3], 8).groups(0).build().init().unwrap_err();

        assert_eq!(
            err,
            ConfigError::InvalidGroups {
                kind: ConvKind::Convolution
            }
        );
    }

    #[test]
    fn channels_must_divide_groups() {
        let err = ConvParamsConfig::builder([3, 3], 10, 6)
            .groups(3)
            .build()
            .init()
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::ChannelsNotDivisibleByGroups {
                kind: ConvKind::Convolution,
                groups: 3,
                input_channels: 10,
                output_channels: 6,
            }
        );
    }

    #[test]
    fn output_channels_must_divide_groups() {
        let err = ConvParamsConfig::builder([3, 3], 6, 10)
            .groups(3)
            .transpose(true)
            .build()
            .init()
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::ChannelsNotDivisibleByGroups {
                kind: ConvKind::Deconvolution,
                ..
            }
        ));
    }

    #[rstest]
    #[case::kernel_width(config([0, 3], 4).build(), ConfigError::InvalidKernelShape { kind: ConvKind::Convolution, width: 0, height: 3 })]
    #[case::kernel_height(config([3, 0], 4).build(), ConfigError::InvalidKernelShape { kind: ConvKind::Convolution, width: 3, height: 0 })]
    #[case::stride(config([3, 3], 4).stride_dims([1, 0]).build(), ConfigError::InvalidStride { kind: ConvKind::Convolution, width: 1, height: 0 })]
    #[case::dilation(config([3, 3], 4).dilation([0, 2]).build(), ConfigError::InvalidDilation { kind: ConvKind::Convolution, width: 0, height: 2 })]
    #[case::zero_scale(config([3, 3], 4).kernel_scale(0.0).build(), ConfigError::InvalidScale { kind: ConvKind::Convolution, scale: 0.0 })]
    #[case::negative_scale(config([3, 3], 4).kernel_scale(-1.0).build(), ConfigError::InvalidScale { kind: ConvKind::Convolution, scale: -1.0 })]
    #[case::infinite_scale(config([3, 3], 4).kernel_scale(f32::INFINITY).build(), ConfigError::InvalidScale { kind: ConvKind::Convolution, scale: f32::INFINITY })]
    #[case::subnormal_scale(config([3, 3], 4).kernel_scale(1.0e-40).build(), ConfigError::InvalidScale { kind: ConvKind::Convolution, scale: 1.0e-40 })]
    fn invalid_geometry(#[case] config: ConvParamsConfig, #[case] expected: ConfigError) {
        assert_eq!(config.init().unwrap_err(), expected);
    }

    #[test]
    fn nan_scale_is_invalid() {
        let err = config([3, 3], 4)
            .kernel_scale(f32::NAN)
            .build()
            .init()
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidScale { scale, .. } if scale.is_nan()));
    }

    #[test]
    fn groups_are_checked_first() {
        let err = ConvParamsConfig::builder([0, 0], 5, 5)
            .groups(0)
            .kernel_scale(-1.0)
            .build()
            .init()
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidGroups { .. }));
    }

    #[test]
    fn rejected_config_is_reported_as_error() {
        let sink = MemorySink::new();
        let err = config([3, 3], 4)
            .stride_dims([0, 0])
            .transpose(true)
            .build()
            .init_with_sink(&sink)
            .unwrap_err();

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics, [Diagnostic::error(&err)]);
        assert_eq!(
            diagnostics[0].message,
            "failed to create deconvolution with 0x0 subsampling: subsampling dimensions must be non-zero"
        );
    }

    #[test]
    fn inefficiencies_are_advisory() {
        let sink = MemorySink::new();
        let params = config([1, 1], 16)
            .stride_dims([2, 2])
            .build()
            .init_with_sink(&sink)
            .unwrap();

        assert!(sink.with_severity(Severity::Error).is_empty());
        assert_eq!(sink.with_severity(Severity::Info).len(), 2);
        assert_eq!(params.ukernel_type(), UKernelType::Conv);
        assert_eq!(params.group_input_channels(), 16);
    }

    #[test]
    fn efficient_config_is_silent() {
        let sink = MemorySink::new();
        config([3, 3], 16)
            .padding([1, 1, 1, 1])
            .build()
            .init_with_sink(&sink)
            .unwrap();

        assert!(sink.diagnostics().is_empty());
    }

    #[rstest]
    #[case::grouped(config([3, 3], 16).groups(4).padding([1, 1, 1, 1]).build(), UKernelType::Conv)]
    #[case::depthwise_one_per_group(config([3, 3], 4).groups(4).build(), UKernelType::DwConv)]
    #[case::depthwise_5x5(config([5, 5], 8).groups(8).stride_dims([2, 2]).build(), UKernelType::DwConv)]
    #[case::pointwise(config([1, 1], 64).build(), UKernelType::Gemm)]
    #[case::pointwise_padded(config([1, 1], 64).padding([0, 1, 0, 0]).build(), UKernelType::Conv)]
    #[case::dense(config([3, 3], 64).build(), UKernelType::Conv)]
    #[case::transposed_pointwise(config([1, 1], 64).transpose(true).build(), UKernelType::Conv)]
    #[case::transposed_depthwise(config([3, 3], 4).groups(4).transpose(true).build(), UKernelType::Conv)]
    fn ukernel_selection(#[case] config: ConvParamsConfig, #[case] expected: UKernelType) {
        assert_eq!(config.init().unwrap().ukernel_type(), expected);
    }

    #[test]
    fn same_padding_output() {
        let params = config([3, 3], 8).padding([1, 1, 1, 1]).build().init().unwrap();

        assert_eq!(params.compute_output_dims([8, 8]), [8, 8]);
    }

    #[test]
    fn strided_output() {
        let params = config([3, 3], 8).stride_dims([2, 2]).build().init().unwrap();

        assert_eq!(params.compute_output_dims([7, 7]), [3, 3]);
    }

    #[test]
    fn transposed_output() {
        let params = config([3, 3], 8)
            .stride_dims([2, 2])
            .transpose(true)
            .build()
            .init()
            .unwrap();

        assert_eq!(params.compute_output_dims([3, 3]), [7, 7]);
    }

    #[test]
    fn output_axes_use_their_own_geometry() {
        // Width: (10 + 0 + 2 - 5) / 1 + 1 = 8, height: (10 + 1 + 0 - 3) / 2 + 1 = 5.
        let params = ConvParamsConfig::builder([5, 3], 4, 4)
            .stride_dims([1, 2])
            .padding([1, 0, 0, 2])
            .build()
            .init()
            .unwrap();

        assert_eq!(params.compute_output_dims([10, 10]), [8, 5]);
    }

    #[test]
    fn transposed_output_uses_adjustment_per_axis() {
        // Width: 2 * 3 + 1 + 3 - 0 = 10, height: 2 * 3 + 0 + 3 - 2 = 7.
        let params = config([3, 3], 4)
            .stride_dims([2, 2])
            .padding([1, 0, 1, 0])
            .adjustment_dims([1, 0])
            .transpose(true)
            .build()
            .init()
            .unwrap();

        assert_eq!(params.compute_output_dims([4, 4]), [10, 7]);
    }

    #[test]
    fn checked_output_reports_axis() {
        let params = ConvParamsConfig::builder([2, 5], 4, 4).build().init().unwrap();

        assert_eq!(params.try_compute_output_dims([4, 5]), Ok([3, 1]));
        assert_eq!(
            params.try_compute_output_dims([4, 4]),
            Err(ShapeError::OutputDimensionUnderflow {
                kind: ConvKind::Convolution,
                axis: Axis::Height,
                input_dim: 4,
                pad_dim: 0,
                effective_kernel: 5,
            })
        );
    }

    #[test]
    fn checked_transposed_output_rejects_empty_input() {
        let params = config([3, 3], 4)
            .stride_dims([2, 2])
            .transpose(true)
            .build()
            .init()
            .unwrap();

        assert_eq!(
            params.try_compute_output_dims([0, 0]),
            Err(ShapeError::OutputDimensionUnderflow {
                kind: ConvKind::Deconvolution,
                axis: Axis::Width,
                input_dim: 0,
                pad_dim: 0,
                effective_kernel: 3,
            })
        );
        assert_eq!(params.try_compute_output_dims([1, 1]), Ok([3, 3]));
    }

    #[test]
    fn derived_helpers() {
        let params = ConvParamsConfig::builder([3, 5], 8, 8)
            .dilation([2, 1])
            .groups(8)
            .padding([0, 0, 1, 0])
            .build()
            .init()
            .unwrap();

        assert_eq!(params.kernel_size(), 15);
        assert_eq!(params.effective_kernel_dims(), [5, 5]);
        assert!(params.has_padding());
        assert!(params.is_depthwise());
        assert_eq!(params.kind(), ConvKind::Convolution);
        assert_eq!(
            UKernelType::classify(&params.ukernel_shape()),
            params.ukernel_type()
        );
    }

    #[test]
    fn config_round_trip() {
        let config = config([3, 3], 8)
            .groups(2)
            .kernel_zero_point(128)
            .kernel_scale(0.25)
            .output_min(10)
            .output_max(200)
            .build();
        let params = config.init().unwrap();

        assert_eq!(params.config(), config);
        assert_eq!(params.config().init().unwrap(), params);
    }

    #[test]
    fn output_bounds_are_not_validated() {
        let params = config([3, 3], 8)
            .output_min(200)
            .output_max(10)
            .build()
            .init()
            .unwrap();

        assert_eq!((params.output_min(), params.output_max()), (200, 10));
    }
}
