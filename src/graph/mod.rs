//! The render graph compiles a declarative description of a frame into
//! Vulkan render passes with full synchronization state, and records it into
//! a command buffer.
//!
//! Each pass declares the resources it touches and how, under symbolic names.
//! From those declarations the graph derives everything else: an execution
//! order consistent with the producer/consumer relation, groups of passes
//! that share framebuffer attachments and merge into subpasses of one render
//! pass, the subpass and external dependencies that make each access wait on
//! the accesses before it, attachment layouts and load/store operations, and
//! the transient images backing attachments that live only for one frame.
//!
//! # Example
//!
//! A pass rendering into a swapchain image:
//!
//! ```
//! use std::sync::Arc;
//! use deimos::prelude::*;
//! use deimos::ash::vk;
//!
//! # fn main() -> anyhow::Result<()> {
//! fn record(cmd: CommandBuffer) -> anyhow::Result<CommandBuffer> {
//!     cmd.bind_named_pipeline("triangle")?
//!         .set_viewport(0, RenderArea::FULL)?
//!         .set_scissor(0, RenderArea::FULL)?
//!         .draw(3, 1, 0, 0)
//! }
//!
//! let swapchain = Arc::new(Swapchain {
//!     format: vk::Format::B8G8R8A8_SRGB,
//!     extent: vk::Extent2D { width: 1280, height: 720 },
//!     image_views: vec![],
//! });
//!
//! let mut graph = RenderGraph::new();
//! graph.add_pass(
//!     PassBuilder::new("triangle")
//!         .resource(Resource::image("swap", ImageAccess::ColorWrite))
//!         .executor(record)
//!         .build(),
//! );
//! graph.bind_attachment_to_swapchain("swap", swapchain.clone(), ClearValue::Color([0.0, 0.0, 0.0, 1.0]));
//! graph.build()?;
//!
//! assert_eq!(graph.render_pass_infos().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Building is pure: no Vulkan objects are created until
//! [`RenderGraph::execute`](render_graph::RenderGraph::execute) realizes the
//! graph against the frame resource collaborator and returns the recorded
//! command buffer.

pub mod attachment;
pub mod debug;
pub mod pass;
pub mod physical;
pub mod render_graph;
pub mod resource;
pub mod sync;

pub(crate) mod record;
