//! Flat re-exports of the common API surface.

pub use crate::command_buffer::state::{
    BlendPreset, GraphicsPipelineDescription, RasterizationState, RenderArea, SamplerDescription, VertexFormat,
    VertexMember,
};
pub use crate::command_buffer::CommandBuffer;
pub use crate::core::device::Device;
pub use crate::core::error::Error;
pub use crate::core::name::Name;
pub use crate::graph::attachment::{AttachmentKind, ClearValue, Swapchain, SwapchainRef};
pub use crate::graph::debug::GraphViz;
pub use crate::graph::pass::{EmptyPassExecutor, PassBuilder, PassExecutor};
pub use crate::graph::render_graph::RenderGraph;
pub use crate::graph::resource::{BufferAccess, ImageAccess, Resource, ResourceType, Use};
pub use crate::resource::buffer::{BufferSlice, MemoryUsage};
pub use crate::resource::image::{ImageView, TransientImageInfo};
pub use crate::resource::pool::{FrameResources, PipelineHandles};
