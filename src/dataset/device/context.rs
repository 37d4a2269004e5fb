use crate::dataset::common::Result;

#[cfg(cuda_device)]
use crate::dataset::common::DatasetError;
#[cfg(cuda_device)]
use cudarc::driver::safe::CudaStream;
#[cfg(cuda_device)]
use std::sync::Arc;

/// Handle to the device all dataset buffers live on.
#[cfg(cuda_device)]
pub struct DeviceContext {
    pub(crate) stream: Arc<CudaStream>,
}

#[cfg(cuda_device)]
impl DeviceContext {
    /// Initialize the CUDA context on the default device.
    pub fn new() -> Result<Self> {
        let ctx = cudarc::driver::safe::CudaContext::new(0)
            .map_err(|e| DatasetError::DeviceError(e.to_string()))?;
        let stream = ctx.default_stream();
        Ok(Self { stream })
    }

    /// Blocks until all outstanding device work has completed.
    pub fn synchronize(&self) -> Result<()> {
        self.stream
            .synchronize()
            .map_err(|e| DatasetError::DeviceError(e.to_string()))
    }
}

/// Handle to the device all dataset buffers live on. Host-staged
/// stand-in used when no CUDA driver is available.
#[cfg(not(cuda_device))]
pub struct DeviceContext;

#[cfg(not(cuda_device))]
impl DeviceContext {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }

    pub fn synchronize(&self) -> Result<()> {
        Ok(())
    }
}
