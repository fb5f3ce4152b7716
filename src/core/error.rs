//! Exposes the deimos error type.

use ash::vk;
use gpu_allocator::AllocationError;
use thiserror::Error;

use crate::core::name::Name;

/// Error type that deimos can return.
#[derive(Error, Debug)]
pub enum Error {
    /// A pass reads a resource that no pass produces and no attachment binding provides.
    #[error("Resource `{0}` is not produced by any pass and has no attachment binding.")]
    ResourceNotProduced(Name),
    /// The same name is used both as an image and as a buffer.
    #[error("Resource `{0}` is declared with incompatible types.")]
    ResourceTypeMismatch(Name),
    /// Two passes form a cycle that cannot be broken by their auxiliary order.
    #[error("Passes `{0}` and `{1}` cannot be ordered.")]
    UnresolvedCycle(Name, Name),
    /// A framebuffer attachment resource has no binding.
    #[error("Attachment `{0}` has no binding.")]
    MissingAttachment(Name),
    /// A swapchain attachment was not matched by any of the supplied acquisitions.
    #[error("Swapchain attachment `{0}` has no matching acquisition.")]
    NoSwapchainAcquisition(Name),
    /// Named pipeline not registered with the frame resources.
    #[error("Named pipeline `{0}` not found.")]
    PipelineNotFound(Name),
    /// The graph was executed before it was built.
    #[error("Graph must be built before it can be executed.")]
    NotBuilt,
    /// The device allocator failed.
    #[error("Allocation error: `{0}`")]
    AllocationFailed(#[from] AllocationError),
    /// Generic Vulkan error type.
    #[error("Vulkan error: `{0}`")]
    VkError(#[from] vk::Result),
    /// A declaration or call violates an API contract.
    #[error("Contract violation: {0}")]
    ContractViolation(&'static str),
}
