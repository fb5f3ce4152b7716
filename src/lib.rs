//! # deimos
//!
//! A render graph compiler and scheduler for Vulkan.
//!
//! Client code declares passes together with the images and buffers each pass
//! reads and writes under symbolic names. The graph turns that declaration
//! into a schedule: a topological pass order, render passes whose subpasses
//! share framebuffer attachments, the full set of subpass and external
//! dependencies, layout transitions and load/store operations required for
//! correctness, and finally a recorded command buffer.
//!
//! Device objects are never created by the graph itself. Everything is
//! acquired through the [`FrameResources`] collaborator trait: transient
//! images, cached render passes, framebuffers, samplers, pipelines,
//! descriptor sets and command buffers.
//!
//! See the [`graph`] module documentation for a usage walkthrough.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod command_buffer;
pub mod core;
pub mod graph;
pub mod prelude;
pub mod resource;

pub use ash;

pub use crate::command_buffer::state::{
    BlendPreset, DescriptorBinding, DescriptorSetBindings, GraphicsPipelineDescription, RasterizationState, RenderArea,
    SamplerDescription, VertexAttribute, VertexBinding, VertexFormat, VertexMember,
};
pub use crate::command_buffer::CommandBuffer;
pub use crate::core::device::Device;
pub use crate::core::error::Error;
pub use crate::core::name::Name;
pub use crate::graph::attachment::{AttachmentInfo, AttachmentKind, ClearValue, Swapchain, SwapchainRef};
pub use crate::graph::debug::GraphViz;
pub use crate::graph::pass::{EmptyPassExecutor, Pass, PassBuilder, PassExecutor};
pub use crate::graph::physical::FramebufferDescription;
pub use crate::graph::render_graph::{PassInfo, RenderGraph, RenderPassAttachment, RenderPassInfo, SubpassInfo};
pub use crate::graph::resource::{BufferAccess, ImageAccess, Resource, ResourceAccess, ResourceType, Use, UseRef};
pub use crate::graph::sync::{AttachmentDescription, AttachmentReference, RenderPassDescription, SubpassDependency};
pub use crate::resource::buffer::{BufferSlice, MemoryUsage};
pub use crate::resource::image::{aspect_for_format, ImageView, TransientImageInfo};
pub use crate::resource::pool::{FrameResources, PipelineHandles};
