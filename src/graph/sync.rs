//! Synchronization lowering.
//!
//! Walks the use chain of every resource and turns each adjacent pair of uses
//! into the render pass state that makes the second use wait on the first:
//! a subpass dependency when both uses live in the same render pass, external
//! dependencies when the pair crosses a render pass boundary, and nothing for
//! read-after-read. The same walk derives the attachment descriptions: initial
//! and final layouts from the neighbouring uses, load and store operations
//! from the chain endpoints.

use std::collections::BTreeMap;

use anyhow::Result;
use ash::vk;

use crate::core::name::Name;
use crate::graph::attachment::AttachmentInfo;
use crate::graph::render_graph::{PassInfo, RenderPassInfo};
use crate::graph::resource::{Use, UseChain, UseRef};

/// Hashable mirror of `VkAttachmentDescription`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentDescription {
    pub format: vk::Format,
    pub samples: vk::SampleCountFlags,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub stencil_load_op: vk::AttachmentLoadOp,
    pub stencil_store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
}

impl Default for AttachmentDescription {
    fn default() -> Self {
        Self {
            format: vk::Format::UNDEFINED,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op: vk::AttachmentLoadOp::DONT_CARE,
            store_op: vk::AttachmentStoreOp::DONT_CARE,
            stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::UNDEFINED,
        }
    }
}

/// Hashable mirror of `VkAttachmentReference`. The `attachment` index points
/// into [`RenderPassDescription::attachments`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: vk::ImageLayout,
}

/// Hashable mirror of `VkSubpassDependency`. External edges use
/// [`vk::SUBPASS_EXTERNAL`] on the corresponding side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: vk::PipelineStageFlags,
    pub dst_stage_mask: vk::PipelineStageFlags,
    pub src_access_mask: vk::AccessFlags,
    pub dst_access_mask: vk::AccessFlags,
}

/// Complete description of one render pass, used as the cache key when
/// acquiring the `VkRenderPass` handle.
///
/// Color references are stored flat; `color_ref_offsets[i]` is the exclusive
/// end of subpass `i`'s slice of `color_refs`, so subpass descriptions can
/// point into one array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RenderPassDescription {
    pub attachments: Vec<AttachmentDescription>,
    pub color_refs: Vec<AttachmentReference>,
    pub color_ref_offsets: Vec<u32>,
    pub depth_stencil_refs: Vec<Option<AttachmentReference>>,
    pub dependencies: Vec<SubpassDependency>,
}

impl RenderPassDescription {
    /// Number of subpasses described.
    pub fn subpass_count(&self) -> usize {
        self.color_ref_offsets.len()
    }

    /// The color attachment references of one subpass.
    pub fn color_refs_for(&self, subpass: usize) -> &[AttachmentReference] {
        let end = self.color_ref_offsets[subpass] as usize;
        let start = if subpass > 0 {
            self.color_ref_offsets[subpass - 1] as usize
        } else {
            0
        };
        &self.color_refs[start..end]
    }

    /// The depth stencil attachment reference of one subpass, if any.
    pub fn depth_stencil_ref_for(&self, subpass: usize) -> Option<AttachmentReference> {
        self.depth_stencil_refs[subpass]
    }
}

fn effective_layout(usage: Use) -> vk::ImageLayout {
    // The preinitialized sentinel requests a clear on first use. It is
    // rewritten to undefined for the API, which also means no dependency has
    // to reach back before the clear.
    if usage.layout == vk::ImageLayout::PREINITIALIZED {
        vk::ImageLayout::UNDEFINED
    } else {
        usage.layout
    }
}

/// A pair needs synchronization when either side writes or the image has to
/// change layout in between. Read-after-read with a stable layout is a no-op.
fn is_hazard(left: Use, right: Use) -> bool {
    left.is_write() || right.is_write() || left.layout != right.layout
}

/// Bracket every bound resource's chain with the binding's initial and final
/// uses, then lower all chains.
pub(crate) fn lower(
    passes: &[PassInfo],
    bound: &BTreeMap<Name, AttachmentInfo>,
    chains: &mut BTreeMap<Name, UseChain>,
    rpis: &mut [RenderPassInfo],
) -> Result<()> {
    for (name, info) in bound {
        let Some(chain) = chains.get_mut(name) else {
            trace!("attachment {name} is bound but never used by any pass");
            continue;
        };
        chain.uses.insert(
            0,
            UseRef {
                usage: info.initial,
                pass: None,
            },
        );
        chain.uses.push(UseRef {
            usage: info.final_use,
            pass: None,
        });
    }

    for (name, chain) in chains.iter() {
        lower_chain(passes, name, chain, bound.get(name), rpis)?;
    }
    emit_attachment_references(passes, chains, rpis);
    Ok(())
}

fn lower_chain(
    passes: &[PassInfo],
    name: &Name,
    chain: &UseChain,
    binding: Option<&AttachmentInfo>,
    rpis: &mut [RenderPassInfo],
) -> Result<()> {
    // Chains without a binding have no attachment endpoints and no layouts to
    // manage; the undefined-layout guards below only apply to bound chains.
    let has_layouts = binding.is_some();

    for pair in chain.uses.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        let same_render_pass = match (left.pass, right.pass) {
            (Some(l), Some(r)) => passes[l].render_pass_index == passes[r].render_pass_index,
            _ => false,
        };

        if same_render_pass {
            if is_hazard(left.usage, right.usage) {
                let (l, r) = (left.pass.unwrap(), right.pass.unwrap());
                rpis[passes[r].render_pass_index].description.dependencies.push(SubpassDependency {
                    src_subpass: passes[l].subpass,
                    dst_subpass: passes[r].subpass,
                    src_stage_mask: left.usage.stages,
                    dst_stage_mask: right.usage.stages,
                    src_access_mask: left.usage.access,
                    dst_access_mask: right.usage.access,
                });
            }
            continue;
        }

        let hazard = is_hazard(left.usage, right.usage);

        if let Some(l) = left.pass {
            let rp = &mut rpis[passes[l].render_pass_index];
            if left.usage.is_framebuffer_attachment() {
                if let (Some(info), Some(att)) = (binding, rp.attachment_mut(name)) {
                    att.populate(info);
                    // If a later use or a required end layout exists we
                    // transition for it, otherwise the last layout sticks.
                    if right.pass.is_some() || right.usage.layout != vk::ImageLayout::UNDEFINED {
                        att.description.final_layout = right.usage.layout;
                    } else {
                        att.description.final_layout = left.usage.layout;
                    }
                    att.description.store_op = if right.usage.layout == vk::ImageLayout::UNDEFINED {
                        vk::AttachmentStoreOp::DONT_CARE
                    } else {
                        vk::AttachmentStoreOp::STORE
                    };
                }
            }
            let wanted_downstream = if has_layouts {
                right.usage.layout != vk::ImageLayout::UNDEFINED
            } else {
                true
            };
            if hazard && wanted_downstream {
                rp.description.dependencies.push(SubpassDependency {
                    src_subpass: passes[l].subpass,
                    dst_subpass: vk::SUBPASS_EXTERNAL,
                    src_stage_mask: left.usage.stages,
                    dst_stage_mask: right.usage.stages,
                    src_access_mask: left.usage.access,
                    dst_access_mask: right.usage.access,
                });
            }
        }

        if let Some(r) = right.pass {
            let rp = &mut rpis[passes[r].render_pass_index];
            if right.usage.is_framebuffer_attachment() {
                if let (Some(info), Some(att)) = (binding, rp.attachment_mut(name)) {
                    att.populate(info);
                    // A preceding render pass transitions for us through its
                    // final layout; without one we start from the binding's
                    // initial layout.
                    att.description.initial_layout = if left.pass.is_some() {
                        right.usage.layout
                    } else {
                        left.usage.layout
                    };
                    att.description.load_op = if left.usage.layout == vk::ImageLayout::UNDEFINED {
                        vk::AttachmentLoadOp::DONT_CARE
                    } else if left.usage.layout == vk::ImageLayout::PREINITIALIZED {
                        att.description.initial_layout = vk::ImageLayout::UNDEFINED;
                        vk::AttachmentLoadOp::CLEAR
                    } else {
                        vk::AttachmentLoadOp::LOAD
                    };
                }
            }
            let upstream_synced = if has_layouts {
                effective_layout(left.usage) != vk::ImageLayout::UNDEFINED
            } else {
                true
            };
            if hazard && upstream_synced {
                rp.description.dependencies.push(SubpassDependency {
                    src_subpass: vk::SUBPASS_EXTERNAL,
                    dst_subpass: passes[r].subpass,
                    src_stage_mask: left.usage.stages,
                    dst_stage_mask: right.usage.stages,
                    src_access_mask: left.usage.access,
                    dst_access_mask: right.usage.access,
                });
            }
        }
    }
    Ok(())
}

/// Collect per-subpass attachment references from the chains and flatten them
/// into each render pass description.
fn emit_attachment_references(passes: &[PassInfo], chains: &BTreeMap<Name, UseChain>, rpis: &mut [RenderPassInfo]) {
    let mut color_refs: Vec<Vec<Vec<AttachmentReference>>> =
        rpis.iter().map(|rp| vec![Vec::new(); rp.subpasses.len()]).collect();
    let mut ds_refs: Vec<Vec<Option<AttachmentReference>>> =
        rpis.iter().map(|rp| vec![None; rp.subpasses.len()]).collect();

    for (name, chain) in chains {
        for use_ref in &chain.uses {
            let Some(pass) = use_ref.pass else {
                continue;
            };
            if !use_ref.usage.is_framebuffer_attachment() {
                continue;
            }
            let rp_index = passes[pass].render_pass_index;
            let subpass = passes[pass].subpass as usize;
            let Some(attachment) = rpis[rp_index].attachment_index(name) else {
                continue;
            };
            let reference = AttachmentReference {
                attachment: attachment as u32,
                layout: use_ref.usage.layout,
            };
            if use_ref.usage.layout == vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL {
                color_refs[rp_index][subpass].push(reference);
            } else {
                ds_refs[rp_index][subpass] = Some(reference);
            }
        }
    }

    for (index, rp) in rpis.iter_mut().enumerate() {
        let mut flat = Vec::new();
        let mut offsets = Vec::with_capacity(rp.subpasses.len());
        for refs in &mut color_refs[index] {
            refs.sort_by_key(|r| r.attachment);
            refs.dedup_by_key(|r| r.attachment);
            flat.extend(refs.iter().copied());
            offsets.push(flat.len() as u32);
        }
        rp.description.color_refs = flat;
        rp.description.color_ref_offsets = offsets;
        rp.description.depth_stencil_refs = std::mem::take(&mut ds_refs[index]);
        rp.description.attachments = rp.attachments.iter().map(|a| a.description).collect();
    }
}
