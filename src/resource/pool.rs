//! The narrow interface through which the graph consumes the device-level
//! allocator and object caches.
//!
//! Deimos never creates Vulkan objects itself. Everything it needs for one
//! execution is acquired through [`FrameResources`]: transient images,
//! cached render passes, framebuffers, samplers, pipelines, descriptor sets,
//! the command buffer, and scratch buffer memory. Implementations are expected
//! to key their caches on the description structs passed in, all of which
//! implement `Hash` and `Eq`, and to keep acquired objects alive until the
//! frame has finished executing on the GPU.

use anyhow::Result;
use ash::vk;

use crate::command_buffer::state::{DescriptorSetBindings, GraphicsPipelineDescription, SamplerDescription};
use crate::core::name::Name;
use crate::graph::physical::FramebufferDescription;
use crate::graph::sync::RenderPassDescription;
use crate::resource::buffer::{BufferSlice, MemoryUsage};
use crate::resource::image::{ImageView, TransientImageInfo};

/// Pipeline and layout handle pair returned by the pipeline cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PipelineHandles {
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
}

/// Per-frame collaborator supplying device objects to the graph.
///
/// `acquire_*` calls have get-or-create semantics. A failed call aborts the
/// ongoing `execute` and every transient object acquired so far is returned
/// through [`FrameResources::destroy_transient_image`] and
/// [`FrameResources::release_command_buffer`] before the error propagates.
pub trait FrameResources {
    /// Create an image that lives until the end of the current frame and
    /// return a view covering all of it.
    fn create_transient_image(&mut self, name: &Name, info: &TransientImageInfo) -> Result<ImageView>;

    /// Return a transient image that was handed out by
    /// [`FrameResources::create_transient_image`] during an execution that was
    /// aborted.
    fn destroy_transient_image(&mut self, view: ImageView);

    /// Get or create a render pass matching the description.
    fn acquire_render_pass(&mut self, description: &RenderPassDescription) -> Result<vk::RenderPass>;

    /// Get or create a framebuffer matching the description.
    fn acquire_framebuffer(&mut self, description: &FramebufferDescription) -> Result<vk::Framebuffer>;

    /// Get or create a sampler matching the description.
    fn acquire_sampler(&mut self, description: &SamplerDescription) -> Result<vk::Sampler>;

    /// Get or create a graphics pipeline matching the description.
    fn acquire_pipeline(&mut self, description: &GraphicsPipelineDescription) -> Result<PipelineHandles>;

    /// Get or create a descriptor set holding the given bindings.
    fn acquire_descriptor_set(&mut self, bindings: &DescriptorSetBindings) -> Result<vk::DescriptorSet>;

    /// Acquire a primary command buffer from a pool serving the given queue family.
    fn acquire_command_buffer(&mut self, queue_family: u32) -> Result<vk::CommandBuffer>;

    /// Return a command buffer acquired during an execution that was aborted.
    fn release_command_buffer(&mut self, command_buffer: vk::CommandBuffer);

    /// Allocate a buffer slice that lives until the end of the current frame.
    fn allocate_scratch_buffer(
        &mut self,
        usage: MemoryUsage,
        buffer_usage: vk::BufferUsageFlags,
        size: vk::DeviceSize,
    ) -> Result<BufferSlice>;

    /// Look up a pipeline description registered under a name.
    fn named_pipeline(&self, name: &Name) -> Option<GraphicsPipelineDescription>;
}
