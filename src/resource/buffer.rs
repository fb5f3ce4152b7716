//! Buffer views and memory usage classes understood by the allocator collaborator.

use std::ffi::c_void;
use std::ptr::NonNull;

use ash::vk;

/// The memory usage of an allocation indicates where it should live and which
/// device/host combination can touch it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MemoryUsage {
    /// Device-local memory, the fast path for most resources.
    GpuOnly,
    /// Memory useful for uploading data to the GPU.
    CpuToGpu,
    /// Memory useful for CPU readback of data.
    GpuToCpu,
    /// Host memory that the device never reads.
    CpuOnly,
}

impl MemoryUsage {
    /// Whether allocations of this class expose a host mapping.
    pub fn is_mappable(self) -> bool {
        !matches!(self, MemoryUsage::GpuOnly)
    }
}

impl From<MemoryUsage> for gpu_allocator::MemoryLocation {
    fn from(value: MemoryUsage) -> Self {
        match value {
            MemoryUsage::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryUsage::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
            MemoryUsage::GpuToCpu => gpu_allocator::MemoryLocation::GpuToCpu,
            MemoryUsage::CpuOnly => gpu_allocator::MemoryLocation::CpuToGpu,
        }
    }
}

/// A view into a `VkBuffer` owned by the allocator collaborator. Carries the
/// host mapping when the backing memory is mappable.
#[derive(Derivative, Copy, Clone)]
#[derivative(Debug, PartialEq, Eq, Hash)]
pub struct BufferSlice {
    handle: vk::Buffer,
    offset: vk::DeviceSize,
    size: vk::DeviceSize,
    #[derivative(Debug = "ignore", PartialEq = "ignore", Hash = "ignore")]
    mapped: Option<NonNull<c_void>>,
}

unsafe impl Send for BufferSlice {}

unsafe impl Sync for BufferSlice {}

impl BufferSlice {
    /// Wrap a raw buffer range. `mapped` must point at the start of the range
    /// if the backing memory is host visible.
    pub fn new(handle: vk::Buffer, offset: vk::DeviceSize, size: vk::DeviceSize, mapped: Option<NonNull<c_void>>) -> Self {
        Self {
            handle,
            offset,
            size,
            mapped,
        }
    }

    /// Get unsafe access to the underlying `VkBuffer`.
    /// # Safety
    /// The caller must make sure the owning collaborator keeps the buffer alive while the handle is in use.
    pub unsafe fn handle(&self) -> vk::Buffer {
        self.handle
    }

    /// Offset of this slice inside the buffer.
    pub fn offset(&self) -> vk::DeviceSize {
        self.offset
    }

    /// Size of this slice in bytes.
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Obtain a mapped pointer to the start of the slice, if the backing
    /// memory is host visible.
    pub fn mapped_ptr(&self) -> Option<NonNull<c_void>> {
        self.mapped
    }
}
