//! The command buffer façade handed to pass executors.
//!
//! Wraps the raw `VkCommandBuffer` the graph is recording into and exposes
//! typed state setters and draw calls. Pipelines, samplers and descriptor
//! sets are acquired from the frame resource collaborator on demand: binding
//! state is tracked on the CPU and flushed into Vulkan right before a draw.
//!
//! Methods consume and return the command buffer so calls chain:
//!
//! ```ignore
//! cmd.bind_named_pipeline("tonemap")?
//!     .set_viewport(0, RenderArea::FULL)?
//!     .set_scissor(0, RenderArea::FULL)?
//!     .bind_attachment(0, 0, "hdr", &SamplerDescription::default())?
//!     .draw(3, 1, 0, 0)
//! ```

pub mod state;

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use ash::vk;

use crate::core::device::Device;
use crate::core::error::Error;
use crate::core::name::Name;
use crate::graph::attachment::AttachmentInfo;
use crate::graph::render_graph::resolve_name;
use crate::resource::buffer::{BufferSlice, MemoryUsage};
use crate::resource::image::ImageView;
use crate::resource::pool::{FrameResources, PipelineHandles};
use state::{
    BlendPreset, DescriptorBinding, DescriptorSetBindings, GraphicsPipelineDescription, RasterizationState, RenderArea,
    SamplerDescription, VertexAttribute, VertexBinding, VertexFormat,
};

/// The render pass a command buffer is currently recording inside.
#[derive(Debug, Copy, Clone)]
pub(crate) struct OngoingRenderPass {
    pub(crate) render_pass: vk::RenderPass,
    pub(crate) subpass: u32,
    pub(crate) extent: vk::Extent2D,
}

/// Recording interface passed to every pass executor.
pub struct CommandBuffer<'q> {
    device: &'q Device,
    frame: &'q mut dyn FrameResources,
    attachments: &'q BTreeMap<Name, AttachmentInfo>,
    aliases: &'q HashMap<Name, Name>,
    handle: vk::CommandBuffer,
    ongoing: Option<OngoingRenderPass>,
    current_pipeline: Option<PipelineHandles>,
    rasterization: RasterizationState,
    color_blend: Vec<BlendPreset>,
    dynamic_states: Vec<vk::DynamicState>,
    vertex_buffers: BTreeMap<u32, (BufferSlice, VertexFormat)>,
    vertex_bindings: Vec<VertexBinding>,
    vertex_attributes: Vec<VertexAttribute>,
    set_states: BTreeMap<u32, DescriptorSetBindings>,
}

impl<'q> CommandBuffer<'q> {
    pub(crate) fn new(
        device: &'q Device,
        frame: &'q mut dyn FrameResources,
        attachments: &'q BTreeMap<Name, AttachmentInfo>,
        aliases: &'q HashMap<Name, Name>,
        handle: vk::CommandBuffer,
    ) -> Self {
        Self {
            device,
            frame,
            attachments,
            aliases,
            handle,
            ongoing: None,
            current_pipeline: None,
            rasterization: RasterizationState::default(),
            color_blend: Vec::new(),
            dynamic_states: Vec::new(),
            vertex_buffers: BTreeMap::new(),
            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),
            set_states: BTreeMap::new(),
        }
    }

    pub(crate) fn set_ongoing(&mut self, ongoing: Option<OngoingRenderPass>) {
        self.ongoing = ongoing;
    }

    /// The render pass currently being recorded, if any.
    pub fn render_pass(&self) -> Option<vk::RenderPass> {
        self.ongoing.map(|o| o.render_pass)
    }

    /// The subpass currently being recorded, if any.
    pub fn subpass(&self) -> Option<u32> {
        self.ongoing.map(|o| o.subpass)
    }

    /// Size of the framebuffer currently being rendered to, if any.
    pub fn extent(&self) -> Option<vk::Extent2D> {
        self.ongoing.map(|o| o.extent)
    }

    /// Look up the image currently backing a bound attachment.
    pub fn resolve_attachment(&self, name: impl Into<Name>) -> Option<ImageView> {
        let key = resolve_name(self.aliases, &name.into());
        self.attachments.get(&key).and_then(|info| info.view)
    }

    /// Get unsafe access to the underlying `VkCommandBuffer`.
    /// # Safety
    /// Raw commands recorded through the handle bypass the state tracking of this interface.
    pub unsafe fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }

    /// Acquire and bind the pipeline described by `description`. Vertex
    /// input, rasterization, blend and dynamic state set on this command
    /// buffer are folded into the description, together with the current
    /// render pass and subpass.
    /// # Errors
    /// Fails outside a render pass, or when the pipeline cache fails.
    pub fn bind_pipeline(mut self, description: GraphicsPipelineDescription) -> Result<Self> {
        let ongoing = self
            .ongoing
            .ok_or(Error::ContractViolation("pipelines can only be bound inside a render pass"))?;
        let mut description = description;
        description.vertex_bindings = self.vertex_bindings.clone();
        description.vertex_attributes = self.vertex_attributes.clone();
        description.rasterization = self.rasterization;
        description.color_blend = self.color_blend.clone();
        description.dynamic_states = self.dynamic_states.clone();
        description.render_pass = ongoing.render_pass;
        description.subpass = ongoing.subpass;

        let handles = self.frame.acquire_pipeline(&description)?;
        unsafe {
            self.device
                .cmd_bind_pipeline(self.handle, vk::PipelineBindPoint::GRAPHICS, handles.pipeline)
        };
        self.current_pipeline = Some(handles);
        Ok(self)
    }

    /// Bind a pipeline registered under a name with the frame resources.
    pub fn bind_named_pipeline(self, name: impl Into<Name>) -> Result<Self> {
        let name = name.into();
        let description = self
            .frame
            .named_pipeline(&name)
            .ok_or(Error::PipelineNotFound(name))?;
        self.bind_pipeline(description)
    }

    /// Set the viewport. Fractional regions are resolved against the current
    /// framebuffer and flipped so that y points up.
    pub fn set_viewport(self, index: u32, area: RenderArea) -> Result<Self> {
        let viewport = match area {
            RenderArea::Pixels(rect) => vk::Viewport {
                x: rect.offset.x as f32,
                y: rect.offset.y as f32,
                width: rect.extent.width as f32,
                height: rect.extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            },
            RenderArea::Fractional {
                x,
                y,
                width,
                height,
            } => {
                let extent = self.extent().ok_or(Error::ContractViolation(
                    "framebuffer relative regions require an active render pass",
                ))?;
                let fb_width = extent.width as f32;
                let fb_height = extent.height as f32;
                let flipped_height = -height * fb_height;
                vk::Viewport {
                    x: x * fb_width,
                    y: y * fb_height - flipped_height,
                    width: width * fb_width,
                    height: flipped_height,
                    min_depth: 0.0,
                    max_depth: 1.0,
                }
            }
        };
        unsafe {
            self.device
                .cmd_set_viewport(self.handle, index, std::slice::from_ref(&viewport))
        };
        Ok(self)
    }

    /// Set the scissor rectangle, absolute or framebuffer relative.
    pub fn set_scissor(self, index: u32, area: RenderArea) -> Result<Self> {
        let scissor = match area {
            RenderArea::Pixels(rect) => rect,
            RenderArea::Fractional {
                x,
                y,
                width,
                height,
            } => {
                let extent = self.extent().ok_or(Error::ContractViolation(
                    "framebuffer relative regions require an active render pass",
                ))?;
                vk::Rect2D {
                    offset: vk::Offset2D {
                        x: (x * extent.width as f32) as i32,
                        y: (y * extent.height as f32) as i32,
                    },
                    extent: vk::Extent2D {
                        width: (width * extent.width as f32) as u32,
                        height: (height * extent.height as f32) as u32,
                    },
                }
            }
        };
        unsafe {
            self.device
                .cmd_set_scissor(self.handle, index, std::slice::from_ref(&scissor))
        };
        Ok(self)
    }

    /// Rasterization state for subsequently bound pipelines.
    pub fn set_rasterization(mut self, state: RasterizationState) -> Self {
        self.rasterization = state;
        self
    }

    /// Blend preset of one color attachment for subsequently bound pipelines.
    pub fn set_color_blend(mut self, attachment: u32, preset: BlendPreset) -> Self {
        let index = attachment as usize;
        if self.color_blend.len() <= index {
            self.color_blend.resize(index + 1, BlendPreset::Disabled);
        }
        self.color_blend[index] = preset;
        self
    }

    /// Dynamic states for subsequently bound pipelines.
    pub fn set_dynamic_state(mut self, states: &[vk::DynamicState]) -> Self {
        self.dynamic_states = states.to_vec();
        self
    }

    /// Bind a vertex buffer and describe the data packed into it. Attribute
    /// locations are assigned across all bound vertex buffers in binding
    /// order, so buffers should be bound before the pipeline.
    pub fn bind_vertex_buffer(mut self, binding: u32, buffer: BufferSlice, format: VertexFormat) -> Self {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(self.handle, binding, &[buffer.handle()], &[buffer.offset()]);
        }
        self.vertex_buffers.insert(binding, (buffer, format));
        self.rebuild_vertex_input();
        self
    }

    /// Bind an index buffer.
    pub fn bind_index_buffer(self, buffer: BufferSlice, index_type: vk::IndexType) -> Self {
        unsafe {
            self.device
                .cmd_bind_index_buffer(self.handle, buffer.handle(), buffer.offset(), index_type);
        }
        self
    }

    /// Bind a uniform buffer to a descriptor slot.
    pub fn bind_uniform_buffer(mut self, set: u32, binding: u32, buffer: BufferSlice) -> Self {
        self.record_descriptor(set, binding, DescriptorBinding::UniformBuffer(buffer));
        self
    }

    /// Allocate a frame-lifetime uniform buffer, fill it with `data` and bind it.
    /// # Errors
    /// Fails when the allocator cannot provide host visible memory.
    pub fn bind_scratch_uniform(mut self, set: u32, binding: u32, data: &[u8]) -> Result<Self> {
        let buffer = self.frame.allocate_scratch_buffer(
            MemoryUsage::CpuToGpu,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            data.len() as vk::DeviceSize,
        )?;
        let mapped = buffer
            .mapped_ptr()
            .ok_or(Error::ContractViolation("scratch uniform buffers must be host visible"))?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.as_ptr().cast::<u8>(), data.len());
        }
        self.record_descriptor(set, binding, DescriptorBinding::UniformBuffer(buffer));
        Ok(self)
    }

    /// Bind a combined image sampler to a descriptor slot.
    pub fn bind_sampled_image(mut self, set: u32, binding: u32, view: ImageView, sampler: &SamplerDescription) -> Result<Self> {
        let sampler = self.frame.acquire_sampler(sampler)?;
        self.record_descriptor(
            set,
            binding,
            DescriptorBinding::CombinedImageSampler {
                view,
                sampler,
                layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            },
        );
        Ok(self)
    }

    /// Bind the image currently backing a graph attachment as a combined
    /// image sampler.
    /// # Errors
    /// Fails when no attachment with this name is bound.
    pub fn bind_attachment(self, set: u32, binding: u32, name: impl Into<Name>, sampler: &SamplerDescription) -> Result<Self> {
        let name = name.into();
        let view = self
            .resolve_attachment(&name)
            .ok_or(Error::MissingAttachment(name))?;
        self.bind_sampled_image(set, binding, view, sampler)
    }

    /// Upload push constants through the current pipeline layout.
    /// # Errors
    /// Fails when no pipeline is bound.
    pub fn push_constants<T: Copy>(self, stages: vk::ShaderStageFlags, offset: u32, data: &[T]) -> Result<Self> {
        let handles = self
            .current_pipeline
            .ok_or(Error::ContractViolation("push constants require a bound pipeline"))?;
        unsafe {
            let (_, bytes, _) = data.align_to::<u8>();
            self.device
                .cmd_push_constants(self.handle, handles.layout, stages, offset, bytes);
        }
        Ok(self)
    }

    /// Record a draw. Pending descriptor state is flushed first.
    pub fn draw(mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> Result<Self> {
        self.flush_descriptor_state()?;
        unsafe {
            self.device
                .cmd_draw(self.handle, vertex_count, instance_count, first_vertex, first_instance)
        };
        Ok(self)
    }

    /// Record an indexed draw. Pending descriptor state is flushed first.
    pub fn draw_indexed(
        mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<Self> {
        self.flush_descriptor_state()?;
        unsafe {
            self.device.cmd_draw_indexed(
                self.handle,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            )
        };
        Ok(self)
    }

    fn record_descriptor(&mut self, set: u32, binding: u32, descriptor: DescriptorBinding) {
        let state = self.set_states.entry(set).or_default();
        state.bindings.retain(|(index, _)| *index != binding);
        state.bindings.push((binding, descriptor));
    }

    fn rebuild_vertex_input(&mut self) {
        self.vertex_bindings.clear();
        self.vertex_attributes.clear();
        let mut location = 0;
        for (&binding, (_, format)) in &self.vertex_buffers {
            let (attributes, stride) = format.attributes(binding, location);
            location += attributes.len() as u32;
            self.vertex_attributes.extend(attributes);
            self.vertex_bindings.push(VertexBinding {
                binding,
                stride,
                input_rate: vk::VertexInputRate::VERTEX,
            });
        }
    }

    fn flush_descriptor_state(&mut self) -> Result<()> {
        if self.set_states.is_empty() {
            return Ok(());
        }
        let handles = self
            .current_pipeline
            .ok_or(Error::ContractViolation("descriptor bindings require a bound pipeline"))?;
        for (set, mut bindings) in std::mem::take(&mut self.set_states) {
            bindings.bindings.sort_by_key(|(binding, _)| *binding);
            let descriptor_set = self.frame.acquire_descriptor_set(&bindings)?;
            unsafe {
                self.device.cmd_bind_descriptor_sets(
                    self.handle,
                    vk::PipelineBindPoint::GRAPHICS,
                    handles.layout,
                    set,
                    &[descriptor_set],
                    &[],
                );
            }
        }
        Ok(())
    }
}
