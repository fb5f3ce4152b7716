//! Non-owning image view handles and transient image descriptions.

use ash::vk;

/// Non-owning handle to a `VkImageView` together with the properties the graph
/// needs to bind it. The view is created and destroyed by the frame resource
/// collaborator, deimos only routes it into framebuffers and descriptor sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ImageView {
    handle: vk::ImageView,
    format: vk::Format,
    extent: vk::Extent2D,
    aspect: vk::ImageAspectFlags,
}

impl ImageView {
    /// Wrap a raw image view handle.
    pub fn new(handle: vk::ImageView, format: vk::Format, extent: vk::Extent2D, aspect: vk::ImageAspectFlags) -> Self {
        Self {
            handle,
            format,
            extent,
            aspect,
        }
    }

    /// Get unsafe access to the underlying `VkImageView`.
    /// # Safety
    /// The caller must make sure the owning collaborator keeps the view alive while the handle is in use.
    pub unsafe fn handle(&self) -> vk::ImageView {
        self.handle
    }

    /// Format of the viewed image.
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Size of the viewed image region.
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Image aspect covered by the view.
    pub fn aspect(&self) -> vk::ImageAspectFlags {
        self.aspect
    }
}

/// Creation parameters for a transient image, requested from the frame
/// resource collaborator for the duration of one graph execution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TransientImageInfo {
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    pub usage: vk::ImageUsageFlags,
    pub aspect: vk::ImageAspectFlags,
    pub samples: vk::SampleCountFlags,
}

/// Pick the view aspect for a format. Depth and stencil formats map to their
/// respective aspects, everything else is treated as color.
pub fn aspect_for_format(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM | vk::Format::X8_D24_UNORM_PACK32 | vk::Format::D32_SFLOAT => vk::ImageAspectFlags::DEPTH,
        vk::Format::S8_UINT => vk::ImageAspectFlags::STENCIL,
        vk::Format::D16_UNORM_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        _ => vk::ImageAspectFlags::COLOR,
    }
}
