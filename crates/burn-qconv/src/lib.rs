#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Burn Quantized Convolution Parameters
//!
//! This library validates the geometry of quantized 2D convolutions and transposed convolutions,
//! derives their per-group channel counts, selects the micro-kernel used to run them and predicts
//! their output spatial dimensions.
//!
//! ```rust
//! use burn_qconv::{ConvParamsConfig, UKernelType};
//!
//! let params = ConvParamsConfig::builder([3, 3], 32, 32)
//!     .groups(32)
//!     .padding([1, 1, 1, 1])
//!     .build()
//!     .init()
//!     .unwrap();
//!
//! assert_eq!(params.ukernel_type(), UKernelType::DwConv);
//! assert_eq!(params.compute_output_dims([56, 56]), [56, 56]);
//! ```

#[macro_use]
extern crate derive_new;

extern crate alloc;

/// Configuration of the convolution parameters.
pub mod config;

/// Diagnostics emitted while building the convolution parameters.
pub mod diagnostic;

/// Error types.
pub mod error;

/// Output spatial dimension arithmetic.
pub mod output;

/// Validated convolution parameters.
pub mod params;

/// Micro-kernel selection.
pub mod ukernel;

pub use config::*;
pub use diagnostic::*;
pub use error::*;
pub use output::*;
pub use params::*;
pub use ukernel::*;
