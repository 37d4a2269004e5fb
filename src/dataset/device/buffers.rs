use crate::dataset::common::Result;
use crate::dataset::device::context::DeviceContext;

#[cfg(cuda_device)]
use crate::dataset::common::DatasetError;
#[cfg(cuda_device)]
use crate::dataset::geometry::Ray;
#[cfg(cuda_device)]
use cudarc::driver::safe::CudaSlice;
#[cfg(cuda_device)]
use cudarc::driver::{DeviceRepr, ValidAsZeroBits};

/// Element types storable in a [`DeviceBuffer`].
#[cfg(cuda_device)]
pub trait DevicePod: DeviceRepr + ValidAsZeroBits + Copy + Default + 'static {}
#[cfg(cuda_device)]
impl<T: DeviceRepr + ValidAsZeroBits + Copy + Default + 'static> DevicePod for T {}

/// Element types storable in a [`DeviceBuffer`].
#[cfg(not(cuda_device))]
pub trait DevicePod: Copy + Default + 'static {}
#[cfg(not(cuda_device))]
impl<T: Copy + Default + 'static> DevicePod for T {}

// Ray is #[repr(C)] over six f32 components.
#[cfg(cuda_device)]
unsafe impl DeviceRepr for Ray {}
#[cfg(cuda_device)]
unsafe impl ValidAsZeroBits for Ray {}

/// Owning handle to one device-resident array.
///
/// The handle owns its allocation: dropping it (or [`release`](Self::release))
/// frees the device memory, so bulk teardown is just dropping every
/// handle. An empty handle holds no allocation at all.
#[derive(Debug)]
pub struct DeviceBuffer<T: DevicePod> {
    #[cfg(cuda_device)]
    slice: Option<CudaSlice<T>>,
    #[cfg(not(cuda_device))]
    host: Vec<T>,
}

impl<T: DevicePod> Default for DeviceBuffer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: DevicePod> DeviceBuffer<T> {
    /// A handle with no allocation behind it.
    pub fn empty() -> Self {
        #[cfg(cuda_device)]
        {
            Self { slice: None }
        }
        #[cfg(not(cuda_device))]
        {
            Self { host: Vec::new() }
        }
    }

    /// Allocates `len` zeroed elements on the device.
    pub fn alloc_zeros(ctx: &DeviceContext, len: usize) -> Result<Self> {
        #[cfg(cuda_device)]
        {
            let slice = ctx
                .stream
                .alloc_zeros::<T>(len)
                .map_err(|e| DatasetError::DeviceError(e.to_string()))?;
            Ok(Self { slice: Some(slice) })
        }
        #[cfg(not(cuda_device))]
        {
            let _ = ctx;
            Ok(Self {
                host: vec![T::default(); len],
            })
        }
    }

    /// Copies `data` to the device, reusing the current allocation when
    /// its length already matches and reallocating otherwise. The prior
    /// allocation is never leaked.
    pub fn upload(&mut self, ctx: &DeviceContext, data: &[T]) -> Result<()> {
        #[cfg(cuda_device)]
        {
            if let Some(slice) = self.slice.as_mut() {
                if slice.len() == data.len() {
                    ctx.stream
                        .memcpy_htod(data, slice)
                        .map_err(|e| DatasetError::DeviceError(e.to_string()))?;
                    return Ok(());
                }
            }
            self.slice = Some(
                ctx.stream
                    .clone_htod(data)
                    .map_err(|e| DatasetError::DeviceError(e.to_string()))?,
            );
            Ok(())
        }
        #[cfg(not(cuda_device))]
        {
            let _ = ctx;
            self.host.clear();
            self.host.extend_from_slice(data);
            Ok(())
        }
    }

    /// Copies the buffer contents back to host memory.
    pub fn to_host(&self, ctx: &DeviceContext) -> Result<Vec<T>> {
        #[cfg(cuda_device)]
        {
            match &self.slice {
                Some(slice) => ctx
                    .stream
                    .clone_dtoh(slice)
                    .map_err(|e| DatasetError::DeviceError(e.to_string())),
                None => Ok(Vec::new()),
            }
        }
        #[cfg(not(cuda_device))]
        {
            let _ = ctx;
            Ok(self.host.clone())
        }
    }

    pub fn len(&self) -> usize {
        #[cfg(cuda_device)]
        {
            self.slice.as_ref().map_or(0, |s| s.len())
        }
        #[cfg(not(cuda_device))]
        {
            self.host.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frees the allocation, leaving an empty handle.
    pub fn release(&mut self) {
        #[cfg(cuda_device)]
        {
            self.slice = None;
        }
        #[cfg(not(cuda_device))]
        {
            self.host = Vec::new();
        }
    }
}
