//! Pipeline, sampler and descriptor state descriptions used by the command
//! buffer. All of these are plain owned structs implementing `Hash` and `Eq`
//! so the frame resource collaborator can key its caches on them directly.

use ash::vk;

use crate::core::name::Name;
use crate::resource::buffer::BufferSlice;
use crate::resource::image::ImageView;

/// Viewport or scissor region: absolute pixels, or a fraction of the current
/// framebuffer.
#[derive(Debug, Copy, Clone)]
pub enum RenderArea {
    Pixels(vk::Rect2D),
    Fractional { x: f32, y: f32, width: f32, height: f32 },
}

impl RenderArea {
    /// The whole framebuffer.
    pub const FULL: RenderArea = RenderArea::Fractional {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
}

/// One member of a packed vertex. Ignored members advance the stride without
/// consuming an attribute location.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexMember {
    pub format: vk::Format,
    pub size: u32,
    pub ignore: bool,
}

impl VertexMember {
    /// A member read by the vertex shader.
    pub fn new(format: vk::Format, size: u32) -> Self {
        Self {
            format,
            size,
            ignore: false,
        }
    }

    /// Padding bytes skipped by the vertex shader.
    pub fn padding(size: u32) -> Self {
        Self {
            format: vk::Format::UNDEFINED,
            size,
            ignore: true,
        }
    }
}

/// Packed description of the vertex data in one binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexFormat {
    pub members: Vec<VertexMember>,
}

impl VertexFormat {
    pub fn new(members: impl IntoIterator<Item = VertexMember>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    /// Expand into attribute descriptions starting at `first_location`.
    /// Returns the attributes and the computed stride.
    pub(crate) fn attributes(&self, binding: u32, first_location: u32) -> (Vec<VertexAttribute>, u32) {
        let mut attributes = Vec::new();
        let mut location = first_location;
        let mut offset = 0;
        for member in &self.members {
            if !member.ignore {
                attributes.push(VertexAttribute {
                    location,
                    binding,
                    format: member.format,
                    offset,
                });
                location += 1;
            }
            offset += member.size;
        }
        (attributes, offset)
    }
}

/// Hashable mirror of `VkVertexInputBindingDescription`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexBinding {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: vk::VertexInputRate,
}

/// Hashable mirror of `VkVertexInputAttributeDescription`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: vk::Format,
    pub offset: u32,
}

/// Rasterization state carried into the pipeline description.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RasterizationState {
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
        }
    }
}

/// Blend preset for one color attachment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum BlendPreset {
    #[default]
    Disabled,
    AlphaBlend,
    Additive,
}

/// Sampler description, keyed by the sampler cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SamplerDescription {
    pub mag_filter: vk::Filter,
    pub min_filter: vk::Filter,
    pub mipmap_mode: vk::SamplerMipmapMode,
    pub address_mode_u: vk::SamplerAddressMode,
    pub address_mode_v: vk::SamplerAddressMode,
    pub address_mode_w: vk::SamplerAddressMode,
}

impl Default for SamplerDescription {
    fn default() -> Self {
        Self {
            mag_filter: vk::Filter::LINEAR,
            min_filter: vk::Filter::LINEAR,
            mipmap_mode: vk::SamplerMipmapMode::LINEAR,
            address_mode_u: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            address_mode_v: vk::SamplerAddressMode::CLAMP_TO_EDGE,
            address_mode_w: vk::SamplerAddressMode::CLAMP_TO_EDGE,
        }
    }
}

/// Complete graphics pipeline description, keyed by the pipeline cache.
///
/// The shader program is referenced by name and resolved by the collaborator.
/// Vertex input, dynamic state, blending and the render pass are filled in by
/// the command buffer when the pipeline is bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphicsPipelineDescription {
    pub name: Name,
    pub vertex_bindings: Vec<VertexBinding>,
    pub vertex_attributes: Vec<VertexAttribute>,
    pub rasterization: RasterizationState,
    pub color_blend: Vec<BlendPreset>,
    pub dynamic_states: Vec<vk::DynamicState>,
    pub render_pass: vk::RenderPass,
    pub subpass: u32,
}

impl GraphicsPipelineDescription {
    /// Description referencing a registered shader program, with default state.
    pub fn named(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),
            rasterization: RasterizationState::default(),
            color_blend: Vec::new(),
            dynamic_states: Vec::new(),
            render_pass: vk::RenderPass::null(),
            subpass: 0,
        }
    }
}

/// One descriptor bound to a set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DescriptorBinding {
    UniformBuffer(BufferSlice),
    CombinedImageSampler {
        view: ImageView,
        sampler: vk::Sampler,
        layout: vk::ImageLayout,
    },
}

/// Bindings of one descriptor set, keyed by the descriptor set cache.
/// Bindings are kept sorted by binding index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DescriptorSetBindings {
    pub bindings: Vec<(u32, DescriptorBinding)>,
}
