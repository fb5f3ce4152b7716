//! Attachment bindings: the way concrete images enter the graph.

use std::sync::Arc;

use ash::vk;

use crate::graph::resource::Use;
use crate::resource::image::ImageView;

/// Clear value for an attachment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

impl ClearValue {
    pub(crate) fn to_vk(self) -> vk::ClearValue {
        match self {
            ClearValue::Color(float32) => vk::ClearValue {
                color: vk::ClearColorValue {
                    float32,
                },
            },
            ClearValue::DepthStencil {
                depth,
                stencil,
            } => vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth,
                    stencil,
                },
            },
        }
    }
}

/// Borrowed description of a swapchain. The graph never talks to the
/// presentation engine, it only picks the image view matching the acquisition
/// supplied to `execute`. Swapchains are matched by `Arc` identity.
#[derive(Debug)]
pub struct Swapchain {
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    pub image_views: Vec<ImageView>,
}

/// Shared handle to a [`Swapchain`] description.
pub type SwapchainRef = Arc<Swapchain>;

/// Where the image backing an attachment comes from.
#[derive(Debug, Clone)]
pub enum AttachmentKind {
    /// Presented image, borrowed from the swapchain for one frame.
    Swapchain(SwapchainRef),
    /// Transient image created by the graph for one execution.
    Internal,
    /// Image owned by the caller, borrowed for the graph lifetime.
    External,
}

/// Everything known about one bound attachment.
#[derive(Debug, Clone)]
pub struct AttachmentInfo {
    pub(crate) kind: AttachmentKind,
    pub(crate) format: vk::Format,
    pub(crate) samples: vk::SampleCountFlags,
    pub(crate) extent: vk::Extent2D,
    pub(crate) clear_value: Option<ClearValue>,
    pub(crate) should_clear: bool,
    pub(crate) initial: Use,
    pub(crate) final_use: Use,
    pub(crate) view: Option<ImageView>,
}

impl AttachmentInfo {
    /// For presentation we wait on color attachment output. The previous
    /// contents are irrelevant, the first use clears. The trailing use hands
    /// the image to the presentation engine, which synchronizes through the
    /// submit semaphore rather than a graph dependency.
    pub(crate) fn swapchain(swapchain: SwapchainRef, clear: ClearValue) -> Self {
        Self {
            format: swapchain.format,
            samples: vk::SampleCountFlags::TYPE_1,
            extent: swapchain.extent,
            clear_value: Some(clear),
            should_clear: true,
            initial: Use {
                stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                access: vk::AccessFlags::empty(),
                layout: vk::ImageLayout::PREINITIALIZED,
            },
            final_use: Use {
                stages: vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                access: vk::AccessFlags::empty(),
                layout: vk::ImageLayout::PRESENT_SRC_KHR,
            },
            view: None,
            kind: AttachmentKind::Swapchain(swapchain),
        }
    }

    /// Internal attachments never preserve previous data and are abandoned
    /// after the last use, so the trailing layout stays undefined.
    pub(crate) fn internal(format: vk::Format, extent: vk::Extent2D, clear: ClearValue) -> Self {
        Self {
            kind: AttachmentKind::Internal,
            format,
            samples: vk::SampleCountFlags::TYPE_1,
            extent,
            clear_value: Some(clear),
            should_clear: true,
            initial: Use {
                stages: vk::PipelineStageFlags::TOP_OF_PIPE,
                access: vk::AccessFlags::empty(),
                layout: vk::ImageLayout::PREINITIALIZED,
            },
            final_use: Use {
                stages: vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                access: vk::AccessFlags::empty(),
                layout: vk::ImageLayout::UNDEFINED,
            },
            view: None,
        }
    }

    pub(crate) fn external(view: ImageView, initial: Use, final_use: Use) -> Self {
        Self {
            kind: AttachmentKind::External,
            format: view.format(),
            samples: vk::SampleCountFlags::TYPE_1,
            extent: view.extent(),
            clear_value: None,
            should_clear: false,
            initial,
            final_use,
            view: Some(view),
        }
    }

    /// Where the backing image comes from.
    pub fn kind(&self) -> &AttachmentKind {
        &self.kind
    }

    /// Format of the attachment.
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Size of the attachment.
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// The image view currently backing the attachment. Filled in during `execute`.
    pub fn view(&self) -> Option<ImageView> {
        self.view
    }
}
