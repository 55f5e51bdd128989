use alloc::format;
use alloc::string::{String, ToString};
use bon::Builder;
use core::fmt::Display;

use crate::{ConfigError, ConfigIoError, ConvParams, DiagnosticSink};

/// Configuration to create [convolution parameters](ConvParams) using the
/// [init function](ConvParamsConfig::init).
///
/// Built with [ConvParamsConfig::builder], which takes the required fields. Spatial pairs are
/// `[width, height]` and padding is `[top, left, bottom, right]`.
#[derive(Debug, Clone, PartialEq, Builder, serde::Serialize, serde::Deserialize)]
pub struct ConvParamsConfig {
    /// The size of the kernel.
    #[builder(start_fn)]
    pub kernel_dims: [u32; 2],
    /// The number of input channels.
    #[builder(start_fn)]
    pub input_channels: usize,
    /// The number of output channels.
    #[builder(start_fn)]
    pub output_channels: usize,
    /// The subsampling of the convolution.
    #[serde(default = "default_pair")]
    #[builder(default = default_pair())]
    pub stride_dims: [u32; 2],
    /// Spacing between kernel elements.
    #[serde(default = "default_pair")]
    #[builder(default = default_pair())]
    pub dilation: [u32; 2],
    /// The input padding.
    #[serde(default)]
    #[builder(default)]
    pub padding: [u32; 4],
    /// Extra output size of transposed convolutions.
    #[serde(default)]
    #[builder(default)]
    pub adjustment_dims: [u32; 2],
    /// Controls the connections between input and output channels.
    #[serde(default = "default_groups")]
    #[builder(default = default_groups())]
    pub groups: u32,
    /// Zero point of the quantized weights.
    #[serde(default)]
    #[builder(default)]
    pub kernel_zero_point: u8,
    /// Scale of the quantized weights.
    #[serde(default = "default_kernel_scale")]
    #[builder(default = default_kernel_scale())]
    pub kernel_scale: f32,
    /// Lower clamp bound of the quantized output.
    #[serde(default)]
    #[builder(default)]
    pub output_min: u8,
    /// Upper clamp bound of the quantized output.
    #[serde(default = "default_output_max")]
    #[builder(default = default_output_max())]
    pub output_max: u8,
    /// If the convolution is transposed.
    #[serde(default)]
    #[builder(default)]
    pub transpose: bool,
}

fn default_pair() -> [u32; 2] {
    [1, 1]
}

fn default_groups() -> u32 {
    1
}

fn default_kernel_scale() -> f32 {
    1.0
}

fn default_output_max() -> u8 {
    u8::MAX
}

impl ConvParamsConfig {
    /// Initialize new [convolution parameters](ConvParams).
    ///
    /// Diagnostics are reported through the [log] facade.
    pub fn init(&self) -> Result<ConvParams, ConfigError> {
        ConvParams::new(self)
    }

    /// Initialize new [convolution parameters](ConvParams), reporting diagnostics to `sink`.
    pub fn init_with_sink(&self, sink: &dyn DiagnosticSink) -> Result<ConvParams, ConfigError> {
        ConvParams::with_sink(self, sink)
    }

    /// Converts the configuration to a JSON string.
    pub fn to_json(&self) -> Result<String, ConfigIoError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| ConfigIoError::InvalidFormat(format!("{err}")))
    }

    /// Loads the configuration from a JSON string.
    ///
    /// Missing optional fields take their default.
    pub fn from_json(content: &str) -> Result<Self, ConfigIoError> {
        serde_json::from_str(content).map_err(|err| ConfigIoError::InvalidFormat(format!("{err}")))
    }

    /// Saves the configuration to a file.
    #[cfg(feature = "std")]
    pub fn save<P: AsRef<std::path::Path>>(&self, file: P) -> std::io::Result<()> {
        let content = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(file, content)
    }

    /// Loads the configuration from a file.
    #[cfg(feature = "std")]
    pub fn load<P: AsRef<std::path::Path>>(file: P) -> Result<Self, ConfigIoError> {
        let content = std::fs::read_to_string(file.as_ref())
            .map_err(|_| ConfigIoError::FileNotFound(file.as_ref().to_string_lossy().to_string()))?;
        Self::from_json(&content)
    }

    /// Loads the configuration from a binary buffer.
    pub fn load_binary(data: &[u8]) -> Result<Self, ConfigIoError> {
        let content = core::str::from_utf8(data).map_err(|_| {
            ConfigIoError::InvalidFormat("Could not parse data as utf-8.".to_string())
        })?;
        Self::from_json(content)
    }
}

impl Display for ConvParamsConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let json = self.to_json().map_err(|_| core::fmt::Error)?;
        f.write_str(&json)
    }
}
