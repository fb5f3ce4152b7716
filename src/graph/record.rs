//! Recording of a realized graph into a command buffer.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use ash::vk;

use crate::command_buffer::{CommandBuffer, OngoingRenderPass};
use crate::core::device::Device;
use crate::core::name::Name;
use crate::graph::attachment::AttachmentInfo;
use crate::graph::physical::FrameScope;
use crate::graph::render_graph::{PassInfo, RenderPassInfo};

/// Record every render pass group in order, invoking each pass executor
/// inside its subpass. Groups without framebuffer attachments execute outside
/// a render pass; their dependencies become pipeline barriers in front of the
/// consuming pass.
pub(crate) fn record_graph(
    device: &Device,
    passes: &mut [PassInfo<'_>],
    rpis: &[RenderPassInfo],
    bound: &BTreeMap<Name, AttachmentInfo>,
    aliases: &HashMap<Name, Name>,
    scope: &mut FrameScope<'_>,
    queue_family: u32,
) -> Result<vk::CommandBuffer> {
    let handle = scope.acquire_command_buffer(queue_family)?;
    let begin_info = vk::CommandBufferBeginInfo {
        s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
        p_next: std::ptr::null(),
        flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
        p_inheritance_info: std::ptr::null(),
    };
    unsafe { device.begin_command_buffer(handle, &begin_info)? };

    let mut cmd = CommandBuffer::new(device, scope.frame(), bound, aliases, handle);

    for rpi in rpis {
        let in_render_pass = !rpi.attachments.is_empty();

        if in_render_pass {
            let clears: Vec<vk::ClearValue> = rpi
                .attachments
                .iter()
                .filter(|a| a.should_clear)
                .filter_map(|a| a.clear_value)
                .map(|c| c.to_vk())
                .collect();
            let extent = rpi.attachments[0].extent;
            let begin = vk::RenderPassBeginInfo {
                s_type: vk::StructureType::RENDER_PASS_BEGIN_INFO,
                p_next: std::ptr::null(),
                render_pass: rpi.handle,
                framebuffer: rpi.framebuffer,
                render_area: vk::Rect2D {
                    offset: vk::Offset2D {
                        x: 0,
                        y: 0,
                    },
                    extent,
                },
                clear_value_count: clears.len() as u32,
                p_clear_values: clears.as_ptr(),
            };
            unsafe { device.cmd_begin_render_pass(handle, &begin, vk::SubpassContents::INLINE) };
        }

        for (subpass_index, subpass) in rpi.subpasses.iter().enumerate() {
            if in_render_pass {
                cmd.set_ongoing(Some(OngoingRenderPass {
                    render_pass: rpi.handle,
                    subpass: subpass_index as u32,
                    extent: rpi.attachments[0].extent,
                }));
            } else {
                for dependency in rpi
                    .description
                    .dependencies
                    .iter()
                    .filter(|d| d.dst_subpass == subpass_index as u32)
                {
                    let barrier = vk::MemoryBarrier {
                        s_type: vk::StructureType::MEMORY_BARRIER,
                        p_next: std::ptr::null(),
                        src_access_mask: dependency.src_access_mask,
                        dst_access_mask: dependency.dst_access_mask,
                    };
                    unsafe {
                        device.cmd_pipeline_barrier(
                            handle,
                            dependency.src_stage_mask,
                            dependency.dst_stage_mask,
                            vk::DependencyFlags::empty(),
                            &[barrier],
                            &[],
                            &[],
                        )
                    };
                }
            }

            let pass = &mut passes[subpass.pass_index];
            cmd = pass.pass.execute.execute(cmd)?;

            if in_render_pass && subpass_index + 1 < rpi.subpasses.len() {
                unsafe { device.cmd_next_subpass(handle, vk::SubpassContents::INLINE) };
            }
        }

        if in_render_pass {
            unsafe { device.cmd_end_render_pass(handle) };
        }
        cmd.set_ongoing(None);
    }

    unsafe { device.end_command_buffer(handle)? };
    Ok(handle)
}
