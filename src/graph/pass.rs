//! This module exposes the [`PassBuilder`] struct, used for declaring passes
//! in a [`RenderGraph`](crate::graph::render_graph::RenderGraph).
//!
//! A pass names every resource it touches together with an access code, and
//! optionally supplies a closure that records its commands when the graph is
//! executed. Resources flow between passes by name: a pass that writes
//! `"color"` feeds every pass that reads `"color"`. A writing pass can rename
//! its output with [`Resource::renamed`](crate::graph::resource::Resource::renamed)
//! to mark a version boundary while the graph keeps tracking the underlying
//! image through the rename chain.
//!
//! # Example
//!
//! A pass that renders into an offscreen color target and a depth buffer:
//!
//! ```
//! use deimos::prelude::*;
//!
//! fn record(cmd: CommandBuffer) -> anyhow::Result<CommandBuffer> {
//!     Ok(cmd)
//! }
//!
//! let pass = PassBuilder::new("geometry")
//!     .resource(Resource::image("color", ImageAccess::ColorWrite))
//!     .resource(Resource::image("depth", ImageAccess::DepthStencilRW))
//!     .executor(record)
//!     .build();
//! assert_eq!(pass.name().as_str(), "geometry");
//! ```

use anyhow::Result;

use crate::command_buffer::CommandBuffer;
use crate::core::name::Name;
use crate::graph::resource::Resource;

/// Trait implemented by anything that can record the commands of one pass.
/// Closures taking and returning a [`CommandBuffer`] implement it.
pub trait PassExecutor {
    fn execute<'q>(&mut self, cmd: CommandBuffer<'q>) -> Result<CommandBuffer<'q>>;
}

impl<F> PassExecutor for F
where
    F: for<'q> FnMut(CommandBuffer<'q>) -> Result<CommandBuffer<'q>>,
{
    fn execute<'q>(&mut self, cmd: CommandBuffer<'q>) -> Result<CommandBuffer<'q>> {
        self(cmd)
    }
}

/// Executor that records nothing. Used for passes that only exist for their
/// synchronization effects.
pub struct EmptyPassExecutor;

impl EmptyPassExecutor {
    pub fn new() -> Self {
        Self {}
    }

    pub fn new_boxed() -> Box<Self> {
        Box::new(Self::new())
    }
}

impl Default for EmptyPassExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PassExecutor for EmptyPassExecutor {
    fn execute<'q>(&mut self, cmd: CommandBuffer<'q>) -> Result<CommandBuffer<'q>> {
        Ok(cmd)
    }
}

pub(crate) type BoxedPassFn<'cb> = Box<dyn PassExecutor + 'cb>;

/// One unit of GPU work declared against the graph. Obtain one through a
/// [`PassBuilder`].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Pass<'cb> {
    pub(crate) name: Name,
    pub(crate) resources: Vec<Resource>,
    #[derivative(Debug = "ignore")]
    pub(crate) execute: BoxedPassFn<'cb>,
    pub(crate) auxiliary_order: u32,
    pub(crate) queue_family: u32,
}

impl Pass<'_> {
    /// Name of the pass.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The resources the pass declared.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }
}

/// Builder for [`Pass`] objects.
pub struct PassBuilder<'cb> {
    inner: Pass<'cb>,
}

impl<'cb> PassBuilder<'cb> {
    /// Start declaring a new pass.
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            inner: Pass {
                name: name.into(),
                resources: Vec::new(),
                execute: EmptyPassExecutor::new_boxed(),
                auxiliary_order: 0,
                queue_family: 0,
            },
        }
    }

    /// Declare a resource access.
    pub fn resource(mut self, resource: Resource) -> Self {
        self.inner.resources.push(resource);
        self
    }

    /// Set the executor called when the pass is recorded. Captured data must
    /// outlive every `execute` call on the graph.
    pub fn executor(mut self, executor: impl PassExecutor + 'cb) -> Self {
        self.inner.execute = Box::new(executor);
        self
    }

    /// Tie-break value for passes that mutually consume each other's outputs.
    /// The pass with the smaller value executes first.
    pub fn auxiliary_order(mut self, order: u32) -> Self {
        self.inner.auxiliary_order = order;
        self
    }

    /// Queue family the pass wants to execute on. All passes of one graph
    /// must agree.
    pub fn queue_family(mut self, family: u32) -> Self {
        self.inner.queue_family = family;
        self
    }

    /// Obtain the built [`Pass`].
    pub fn build(self) -> Pass<'cb> {
        self.inner
    }
}
