//! Resource declarations and the fixed mapping from access codes to pipeline
//! stages, access masks and image layouts.
//!
//! Every subsystem that needs to know whether a use is a framebuffer
//! attachment derives that from the layout in its [`Use`], never from the
//! access code directly. This keeps the lowering table the single source of
//! truth for attachment classification.

use ash::vk;

use crate::core::name::Name;

/// Whether a resource is an image or a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Image,
    Buffer,
}

/// How a pass touches an image resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImageAccess {
    ColorRead,
    ColorWrite,
    ColorRW,
    DepthStencilRead,
    DepthStencilRW,
    FragmentRead,
    FragmentSampled,
    FragmentWrite,
}

/// How a pass touches a buffer resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferAccess {
    VertexRead,
    IndexRead,
    IndirectRead,
    UniformRead,
    StorageRead,
    StorageWrite,
    StorageRW,
    TransferRead,
    TransferWrite,
}

/// Access code of a declared resource, tagged by resource type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceAccess {
    Image(ImageAccess),
    Buffer(BufferAccess),
}

/// The pipeline position one use of a resource occupies: the stages that
/// touch it, the memory accesses performed, and the image layout it must be
/// in. Buffers carry `vk::ImageLayout::UNDEFINED` as their layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Use {
    pub stages: vk::PipelineStageFlags,
    pub access: vk::AccessFlags,
    pub layout: vk::ImageLayout,
}

impl Use {
    /// A use participates in the framebuffer exactly when its layout is one of
    /// the two attachment layouts.
    pub fn is_framebuffer_attachment(self) -> bool {
        matches!(
            self.layout,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL | vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
        )
    }

    /// Whether this use writes the resource.
    pub fn is_write(self) -> bool {
        self.access.intersects(
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
                | vk::AccessFlags::SHADER_WRITE
                | vk::AccessFlags::TRANSFER_WRITE
                | vk::AccessFlags::MEMORY_WRITE,
        )
    }

    /// Whether this use only reads the resource. An empty access mask counts
    /// as a read.
    pub fn is_read(self) -> bool {
        !self.is_write()
    }
}

impl ImageAccess {
    /// Whether a pass declaring this access consumes the resource.
    pub fn is_read(self) -> bool {
        matches!(
            self,
            ImageAccess::ColorRead
                | ImageAccess::ColorRW
                | ImageAccess::DepthStencilRead
                | ImageAccess::DepthStencilRW
                | ImageAccess::FragmentRead
                | ImageAccess::FragmentSampled
        )
    }

    /// Whether a pass declaring this access produces a new version of the resource.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            ImageAccess::ColorWrite | ImageAccess::ColorRW | ImageAccess::DepthStencilRW | ImageAccess::FragmentWrite
        )
    }

    pub(crate) fn to_use(self) -> Use {
        match self {
            ImageAccess::ColorRead => Use {
                stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                access: vk::AccessFlags::COLOR_ATTACHMENT_READ,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            },
            ImageAccess::ColorWrite => Use {
                stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                access: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            },
            ImageAccess::ColorRW => Use {
                stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                access: vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::COLOR_ATTACHMENT_READ,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            },
            ImageAccess::DepthStencilRead => Use {
                stages: vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
                access: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            },
            ImageAccess::DepthStencilRW => Use {
                stages: vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
                access: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            },
            ImageAccess::FragmentRead => Use {
                stages: vk::PipelineStageFlags::FRAGMENT_SHADER,
                access: vk::AccessFlags::SHADER_READ,
                layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            },
            ImageAccess::FragmentSampled => Use {
                stages: vk::PipelineStageFlags::FRAGMENT_SHADER,
                access: vk::AccessFlags::SHADER_READ,
                layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            },
            ImageAccess::FragmentWrite => Use {
                stages: vk::PipelineStageFlags::FRAGMENT_SHADER,
                access: vk::AccessFlags::SHADER_WRITE,
                layout: vk::ImageLayout::GENERAL,
            },
        }
    }
}

impl BufferAccess {
    pub fn is_read(self) -> bool {
        !matches!(self, BufferAccess::StorageWrite | BufferAccess::TransferWrite)
    }

    pub fn is_write(self) -> bool {
        matches!(self, BufferAccess::StorageWrite | BufferAccess::StorageRW | BufferAccess::TransferWrite)
    }

    pub(crate) fn to_use(self) -> Use {
        let (stages, access) = match self {
            BufferAccess::VertexRead => (vk::PipelineStageFlags::VERTEX_INPUT, vk::AccessFlags::VERTEX_ATTRIBUTE_READ),
            BufferAccess::IndexRead => (vk::PipelineStageFlags::VERTEX_INPUT, vk::AccessFlags::INDEX_READ),
            BufferAccess::IndirectRead => (vk::PipelineStageFlags::DRAW_INDIRECT, vk::AccessFlags::INDIRECT_COMMAND_READ),
            BufferAccess::UniformRead => (
                vk::PipelineStageFlags::VERTEX_SHADER | vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::AccessFlags::UNIFORM_READ,
            ),
            BufferAccess::StorageRead => (
                vk::PipelineStageFlags::VERTEX_SHADER | vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::AccessFlags::SHADER_READ,
            ),
            BufferAccess::StorageWrite => (
                vk::PipelineStageFlags::VERTEX_SHADER | vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::AccessFlags::SHADER_WRITE,
            ),
            BufferAccess::StorageRW => (
                vk::PipelineStageFlags::VERTEX_SHADER | vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
            ),
            BufferAccess::TransferRead => (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_READ),
            BufferAccess::TransferWrite => (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_WRITE),
        };
        Use {
            stages,
            access,
            layout: vk::ImageLayout::UNDEFINED,
        }
    }
}

/// A single resource access declared by a pass.
///
/// `src_name` is the name under which the resource enters the pass. For plain
/// reads and writes `use_name` is the same name. A writing pass may rename its
/// output with [`Resource::renamed`], producing a fresh version name that
/// downstream passes consume while the graph keeps track of the underlying
/// identity through the rename chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    pub(crate) src_name: Name,
    pub(crate) use_name: Name,
    pub(crate) access: ResourceAccess,
}

impl Resource {
    /// Declare an image access.
    pub fn image(name: impl Into<Name>, access: ImageAccess) -> Self {
        let name = name.into();
        Self {
            src_name: name.clone(),
            use_name: name,
            access: ResourceAccess::Image(access),
        }
    }

    /// Declare a buffer access.
    pub fn buffer(name: impl Into<Name>, access: BufferAccess) -> Self {
        let name = name.into();
        Self {
            src_name: name.clone(),
            use_name: name,
            access: ResourceAccess::Buffer(access),
        }
    }

    /// Rename the output of this access. The new name identifies the version
    /// produced by the declaring pass; downstream passes consume the resource
    /// under this name.
    pub fn renamed(mut self, use_name: impl Into<Name>) -> Self {
        self.use_name = use_name.into();
        self
    }

    /// The name under which the resource enters the declaring pass.
    pub fn src_name(&self) -> &Name {
        &self.src_name
    }

    /// The name under which the resource leaves the declaring pass.
    pub fn use_name(&self) -> &Name {
        &self.use_name
    }

    /// Whether this is an image or a buffer access.
    pub fn resource_type(&self) -> ResourceType {
        match self.access {
            ResourceAccess::Image(_) => ResourceType::Image,
            ResourceAccess::Buffer(_) => ResourceType::Buffer,
        }
    }

    pub(crate) fn is_read(&self) -> bool {
        match self.access {
            ResourceAccess::Image(access) => access.is_read(),
            ResourceAccess::Buffer(access) => access.is_read(),
        }
    }

    pub(crate) fn is_write(&self) -> bool {
        match self.access {
            ResourceAccess::Image(access) => access.is_write(),
            ResourceAccess::Buffer(access) => access.is_write(),
        }
    }

    pub(crate) fn to_use(&self) -> Use {
        match self.access {
            ResourceAccess::Image(access) => access.to_use(),
            ResourceAccess::Buffer(access) => access.to_use(),
        }
    }

    pub(crate) fn is_framebuffer_attachment(&self) -> bool {
        self.to_use().is_framebuffer_attachment()
    }
}

/// One link in a resource's use chain: the use imposed on the resource and
/// the index of the pass imposing it. Endpoints supplied by an attachment
/// binding carry no pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UseRef {
    pub(crate) usage: Use,
    pub(crate) pass: Option<usize>,
}

impl UseRef {
    /// The use imposed on the resource.
    pub fn usage(&self) -> Use {
        self.usage
    }

    /// Index of the imposing pass in execution order, `None` for attachment endpoints.
    pub fn pass_index(&self) -> Option<usize> {
        self.pass
    }
}

/// Time-ordered sequence of uses of one canonical resource.
#[derive(Debug, Clone)]
pub(crate) struct UseChain {
    pub(crate) ty: ResourceType,
    pub(crate) uses: Vec<UseRef>,
}
