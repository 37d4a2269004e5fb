//! Device memory module
//!
//! Owning handles for device-resident arrays. The CUDA backend is gated
//! behind the `cuda_device` cfg emitted by `build.rs`; without it the
//! same API stages buffers in host memory so the loader and its tests
//! run on machines without a CUDA driver.

pub mod buffers;
pub mod context;

pub use buffers::{DeviceBuffer, DevicePod};
pub use context::DeviceContext;
