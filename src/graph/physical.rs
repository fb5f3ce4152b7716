//! Physical realization: transient images and framebuffers for one execution.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::core::name::Name;
use crate::graph::attachment::{AttachmentInfo, AttachmentKind, SwapchainRef};
use crate::graph::render_graph::RenderPassInfo;
use crate::graph::resource::UseChain;
use crate::resource::image::{aspect_for_format, ImageView, TransientImageInfo};
use crate::resource::pool::FrameResources;

/// Complete description of one framebuffer, used as the cache key when
/// acquiring the `VkFramebuffer` handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferDescription {
    pub render_pass: vk::RenderPass,
    pub attachments: Vec<vk::ImageView>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

/// Tracks every object acquired from the frame resources during one
/// execution. Unless [`FrameScope::finish`] is called after recording
/// succeeded, dropping the scope returns all of them, so an early error exit
/// cannot leak transient images or the command buffer.
pub(crate) struct FrameScope<'a> {
    frame: &'a mut dyn FrameResources,
    transients: Vec<ImageView>,
    command_buffer: Option<vk::CommandBuffer>,
    armed: bool,
}

impl<'a> FrameScope<'a> {
    pub(crate) fn new(frame: &'a mut dyn FrameResources) -> Self {
        Self {
            frame,
            transients: Vec::new(),
            command_buffer: None,
            armed: true,
        }
    }

    pub(crate) fn create_transient_image(&mut self, name: &Name, info: &TransientImageInfo) -> Result<ImageView> {
        let view = self.frame.create_transient_image(name, info)?;
        self.transients.push(view);
        Ok(view)
    }

    pub(crate) fn acquire_command_buffer(&mut self, queue_family: u32) -> Result<vk::CommandBuffer> {
        let command_buffer = self.frame.acquire_command_buffer(queue_family)?;
        self.command_buffer = Some(command_buffer);
        Ok(command_buffer)
    }

    pub(crate) fn frame(&mut self) -> &mut dyn FrameResources {
        &mut *self.frame
    }

    /// Hand ownership of everything acquired to the caller's frame. Called
    /// once recording completed.
    pub(crate) fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for view in self.transients.drain(..) {
            self.frame.destroy_transient_image(view);
        }
        if let Some(command_buffer) = self.command_buffer.take() {
            self.frame.release_command_buffer(command_buffer);
        }
    }
}

/// Union of the image usage bits a chain demands from its backing image.
pub(crate) fn transient_usage(chain: &UseChain) -> vk::ImageUsageFlags {
    let mut usage = vk::ImageUsageFlags::empty();
    for use_ref in &chain.uses {
        match use_ref.usage.layout {
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => usage |= vk::ImageUsageFlags::COLOR_ATTACHMENT,
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => usage |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => usage |= vk::ImageUsageFlags::SAMPLED,
            vk::ImageLayout::GENERAL => usage |= vk::ImageUsageFlags::STORAGE,
            _ => {}
        }
    }
    usage
}

/// Create transient images for internal attachments and pick swapchain image
/// views from the supplied acquisitions.
pub(crate) fn realize_attachments(
    bound: &mut BTreeMap<Name, AttachmentInfo>,
    chains: &BTreeMap<Name, UseChain>,
    swapchains: &[(SwapchainRef, u32)],
    scope: &mut FrameScope<'_>,
) -> Result<()> {
    for (name, info) in bound.iter_mut() {
        match &info.kind {
            AttachmentKind::Internal => {
                let Some(chain) = chains.get(name) else {
                    continue;
                };
                let create_info = TransientImageInfo {
                    format: info.format,
                    extent: info.extent,
                    usage: transient_usage(chain),
                    aspect: aspect_for_format(info.format),
                    samples: info.samples,
                };
                let view = scope.create_transient_image(name, &create_info)?;
                trace!("created transient image for attachment {name}");
                info.view = Some(view);
            }
            AttachmentKind::Swapchain(swapchain) => {
                let (acquired, image_index) = swapchains
                    .iter()
                    .find(|(candidate, _)| Arc::ptr_eq(candidate, swapchain))
                    .ok_or_else(|| Error::NoSwapchainAcquisition(name.clone()))?;
                let view = acquired
                    .image_views
                    .get(*image_index as usize)
                    .ok_or(Error::ContractViolation("swapchain image index out of range"))?;
                info.view = Some(*view);
            }
            AttachmentKind::External => {}
        }
    }
    Ok(())
}

/// Acquire the render pass handle and framebuffer of every render pass group.
/// Groups without attachments execute outside a render pass and get neither.
pub(crate) fn realize_framebuffers(
    rpis: &mut [RenderPassInfo],
    bound: &BTreeMap<Name, AttachmentInfo>,
    scope: &mut FrameScope<'_>,
) -> Result<()> {
    for rpi in rpis.iter_mut() {
        if rpi.attachments.is_empty() {
            continue;
        }
        rpi.handle = scope.frame().acquire_render_pass(&rpi.description)?;

        let mut views = Vec::with_capacity(rpi.attachments.len());
        for attachment in &rpi.attachments {
            let info = bound
                .get(&attachment.name)
                .ok_or_else(|| Error::MissingAttachment(attachment.name.clone()))?;
            let view = info.view.ok_or_else(|| Error::MissingAttachment(attachment.name.clone()))?;
            views.push(unsafe { view.handle() });
        }

        let extent = rpi.attachments[0].extent;
        let description = FramebufferDescription {
            render_pass: rpi.handle,
            attachments: views,
            width: extent.width,
            height: extent.height,
            layers: 1,
        };
        rpi.framebuffer = scope.frame().acquire_framebuffer(&description)?;
    }
    Ok(())
}
