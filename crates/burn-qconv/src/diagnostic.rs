use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::Display;

use crate::ConvKind;

/// Severity of a [diagnostic](Diagnostic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Advisory message, the configuration is still valid.
    Info,
    /// The configuration was rejected.
    Error,
}

/// A message produced while building [convolution parameters](crate::ConvParams).
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the message.
    pub severity: Severity,
    /// Formatted message.
    pub message: String,
}

impl Diagnostic {
    /// Creates an informational diagnostic.
    pub fn info(message: impl Display) -> Self {
        Self::new(Severity::Info, message.to_string())
    }

    /// Creates an error diagnostic.
    pub fn error(message: impl Display) -> Self {
        Self::new(Severity::Error, message.to_string())
    }
}

/// Receives the diagnostics emitted while building convolution parameters.
pub trait DiagnosticSink: Send + Sync {
    /// Handles a single diagnostic.
    fn emit(&self, diagnostic: Diagnostic);
}

/// Target of the records written by [LogSink].
pub const LOG_TARGET: &str = "burn_qconv";

/// Forwards diagnostics to the [log] facade under [LOG_TARGET].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => log::info!(target: LOG_TARGET, "{}", diagnostic.message),
            Severity::Error => log::error!(target: LOG_TARGET, "{}", diagnostic.message),
        }
    }
}

/// Keeps every diagnostic in memory.
#[cfg(feature = "std")]
#[derive(Debug, Default)]
pub struct MemorySink {
    diagnostics: std::sync::Mutex<Vec<Diagnostic>>,
}

#[cfg(feature = "std")]
impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded diagnostics, oldest first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self.diagnostics.lock() {
            Ok(diagnostics) => diagnostics.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the recorded diagnostics with the given severity.
    pub fn with_severity(&self, severity: Severity) -> Vec<Diagnostic> {
        self.diagnostics()
            .into_iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .collect()
    }
}

#[cfg(feature = "std")]
impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        match self.diagnostics.lock() {
            Ok(mut diagnostics) => diagnostics.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

/// A valid but wasteful convolution geometry.
///
/// Kernel and stride pairs are `[width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inefficiency {
    /// Height subsampling is coarser than the kernel height.
    StrideHeightExceedsKernel {
        /// Operation being created.
        kind: ConvKind,
        /// Kernel dimensions.
        kernel_dims: [u32; 2],
        /// Subsampling dimensions.
        stride_dims: [u32; 2],
    },
    /// Width subsampling is coarser than the kernel width.
    StrideWidthExceedsKernel {
        /// Operation being created.
        kind: ConvKind,
        /// Kernel dimensions.
        kernel_dims: [u32; 2],
        /// Subsampling dimensions.
        stride_dims: [u32; 2],
    },
    /// Top padding covers the whole kernel height.
    TopPaddingExceedsKernel {
        /// Operation being created.
        kind: ConvKind,
        /// Kernel dimensions.
        kernel_dims: [u32; 2],
        /// Top and bottom padding.
        padding: [u32; 2],
    },
    /// Bottom padding covers the whole kernel height.
    BottomPaddingExceedsKernel {
        /// Operation being created.
        kind: ConvKind,
        /// Kernel dimensions.
        kernel_dims: [u32; 2],
        /// Top and bottom padding.
        padding: [u32; 2],
    },
    /// Right padding covers the whole kernel width.
    RightPaddingExceedsKernel {
        /// Operation being created.
        kind: ConvKind,
        /// Kernel dimensions.
        kernel_dims: [u32; 2],
        /// Left and right padding.
        padding: [u32; 2],
    },
    /// Left padding covers the whole kernel width.
    LeftPaddingExceedsKernel {
        /// Operation being created.
        kind: ConvKind,
        /// Kernel dimensions.
        kernel_dims: [u32; 2],
        /// Left and right padding.
        padding: [u32; 2],
    },
}

impl Inefficiency {
    /// Finds every inefficiency of the given geometry.
    ///
    /// `padding` is `[top, left, bottom, right]`. Each condition is checked independently and the
    /// result keeps a stable order: height stride, width stride, top, bottom, right, then left
    /// padding.
    pub fn detect(
        kind: ConvKind,
        kernel_dims: [u32; 2],
        stride_dims: [u32; 2],
        padding: [u32; 4],
    ) -> Vec<Self> {
        let [kernel_width, kernel_height] = kernel_dims;
        let [stride_width, stride_height] = stride_dims;
        let [top, left, bottom, right] = padding;
        let height_padding = [top, bottom];
        let width_padding = [left, right];

        let mut found = Vec::new();

        if stride_height > kernel_height {
            found.push(Self::StrideHeightExceedsKernel {
                kind,
                kernel_dims,
                stride_dims,
            });
        }
        if stride_width > kernel_width {
            found.push(Self::StrideWidthExceedsKernel {
                kind,
                kernel_dims,
                stride_dims,
            });
        }
        if top >= kernel_height {
            found.push(Self::TopPaddingExceedsKernel {
                kind,
                kernel_dims,
                padding: height_padding,
            });
        }
        if bottom >= kernel_height {
            found.push(Self::BottomPaddingExceedsKernel {
                kind,
                kernel_dims,
                padding: height_padding,
            });
        }
        if right >= kernel_width {
            found.push(Self::RightPaddingExceedsKernel {
                kind,
                kernel_dims,
                padding: width_padding,
            });
        }
        if left >= kernel_width {
            found.push(Self::LeftPaddingExceedsKernel {
                kind,
                kernel_dims,
                padding: width_padding,
            });
        }

        found
    }
}

impl Display for Inefficiency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StrideHeightExceedsKernel {
                kind,
                kernel_dims: [kw, kh],
                stride_dims: [sw, sh],
            } => write!(
                f,
                "inefficiency in {kind} with {kw}x{kh} kernel and {sw}x{sh} subsampling: \
                 height subsampling is greater than kernel height; \
                 subsampling should be performed before the {kind}"
            ),
            Self::StrideWidthExceedsKernel {
                kind,
                kernel_dims: [kw, kh],
                stride_dims: [sw, sh],
            } => write!(
                f,
                "inefficiency in {kind} with {kw}x{kh} kernel and {sw}x{sh} subsampling: \
                 width subsampling is greater than kernel width; \
                 subsampling should be performed before the {kind}"
            ),
            Self::TopPaddingExceedsKernel {
                kind,
                kernel_dims: [kw, kh],
                padding: [top, bottom],
            } => write!(
                f,
                "inefficiency in {kind} with {kw}x{kh} kernel and {top}+{bottom} height padding: \
                 input top padding is greater or equal to kernel height"
            ),
            Self::BottomPaddingExceedsKernel {
                kind,
                kernel_dims: [kw, kh],
                padding: [top, bottom],
            } => write!(
                f,
                "inefficiency in {kind} with {kw}x{kh} kernel and {top}+{bottom} height padding: \
                 input bottom padding is greater or equal to kernel height"
            ),
            Self::RightPaddingExceedsKernel {
                kind,
                kernel_dims: [kw, kh],
                padding: [left, right],
            } => write!(
                f,
                "inefficiency in {kind} with {kw}x{kh} kernel and {left}+{right} width padding: \
                 input right padding is greater or equal to kernel width"
            ),
            Self::LeftPaddingExceedsKernel {
                kind,
                kernel_dims: [kw, kh],
                padding: [left, right],
            } => write!(
                f,
                "inefficiency in {kind} with {kw}x{kh} kernel and {left}+{right} width padding: \
                 input left padding is greater or equal to kernel width"
            ),
        }
    }
}
