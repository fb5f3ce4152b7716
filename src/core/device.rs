//! Thin shareable wrapper around the Vulkan device.

use std::ops::Deref;
use std::sync::Arc;

/// Wrapper around an [`ash::Device`]. Internal state is wrapped in an `Arc`,
/// so this is safe to clone and hand out to recorded state.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Device {
    #[derivative(Debug = "ignore")]
    inner: Arc<ash::Device>,
}

impl Device {
    /// Wrap a raw `ash` device. The wrapper does not destroy the device on drop,
    /// ownership of the underlying `VkDevice` stays with the caller.
    pub fn new(device: ash::Device) -> Self {
        Self {
            inner: Arc::new(device),
        }
    }
}

impl Deref for Device {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
