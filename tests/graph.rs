use std::sync::Arc;

use deimos::ash::vk;
use deimos::prelude::*;
use deimos::{AttachmentDescription, RenderPassAttachment, RenderPassInfo, SubpassDependency};

const EXTENT: vk::Extent2D = vk::Extent2D {
    width: 1280,
    height: 720,
};

fn swapchain() -> SwapchainRef {
    Arc::new(Swapchain {
        format: vk::Format::B8G8R8A8_SRGB,
        extent: EXTENT,
        image_views: vec![],
    })
}

fn black() -> ClearValue {
    ClearValue::Color([0.0, 0.0, 0.0, 1.0])
}

fn attachment<'a>(rp: &'a RenderPassInfo, name: &str) -> &'a RenderPassAttachment {
    rp.attachments()
        .iter()
        .find(|a| a.name().as_str() == name)
        .unwrap_or_else(|| panic!("attachment {name} not found"))
}

fn description<'a>(rp: &'a RenderPassInfo, name: &str) -> &'a AttachmentDescription {
    attachment(rp, name).description()
}

fn error_of(result: anyhow::Result<()>) -> Error {
    result.unwrap_err().downcast::<Error>().expect("expected a deimos error")
}

#[test]
fn s1_clear_and_present() -> anyhow::Result<()> {
    let swapchain = swapchain();
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("present")
            .resource(Resource::image("swap", ImageAccess::ColorWrite))
            .build(),
    );
    graph.bind_attachment_to_swapchain("swap", swapchain, black());
    graph.build()?;

    let rpis = graph.render_pass_infos();
    assert_eq!(rpis.len(), 1);
    let rp = &rpis[0];
    assert_eq!(rp.subpasses().len(), 1);
    assert_eq!(rp.description().subpass_count(), 1);

    let swap = description(rp, "swap");
    assert_eq!(swap.load_op, vk::AttachmentLoadOp::CLEAR);
    assert_eq!(swap.store_op, vk::AttachmentStoreOp::STORE);
    assert_eq!(swap.initial_layout, vk::ImageLayout::UNDEFINED);
    assert_eq!(swap.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    assert!(attachment(rp, "swap").should_clear());

    let deps = &rp.description().dependencies;
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].src_subpass, 0);
    assert_eq!(deps[0].dst_subpass, vk::SUBPASS_EXTERNAL);
    assert_eq!(deps[0].src_stage_mask, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
    assert_eq!(deps[0].src_access_mask, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
    assert_eq!(deps[0].dst_stage_mask, vk::PipelineStageFlags::BOTTOM_OF_PIPE);

    assert_eq!(rp.description().color_refs_for(0).len(), 1);
    assert_eq!(rp.description().color_refs_for(0)[0].layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    assert!(rp.description().depth_stencil_ref_for(0).is_none());
    Ok(())
}

#[test]
fn s2_two_passes_different_attachments() -> anyhow::Result<()> {
    let swapchain = swapchain();
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("geometry")
            .resource(Resource::image("depth", ImageAccess::DepthStencilRW))
            .resource(Resource::image("color", ImageAccess::ColorWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("composite")
            .resource(Resource::image("color", ImageAccess::FragmentSampled))
            .resource(Resource::image("swap", ImageAccess::ColorWrite))
            .build(),
    );
    graph.mark_attachment_internal("depth", vk::Format::D32_SFLOAT, EXTENT, ClearValue::DepthStencil {
        depth: 1.0,
        stencil: 0,
    });
    graph.mark_attachment_internal("color", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.bind_attachment_to_swapchain("swap", swapchain, black());
    graph.build()?;

    let rpis = graph.render_pass_infos();
    assert_eq!(rpis.len(), 2);
    let geometry = &rpis[graph.pass_infos()[0].render_pass_index()];
    let composite = &rpis[graph.pass_infos()[1].render_pass_index()];

    let color = description(geometry, "color");
    assert_eq!(color.initial_layout, vk::ImageLayout::UNDEFINED);
    assert_eq!(color.load_op, vk::AttachmentLoadOp::CLEAR);
    assert_eq!(color.final_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(color.store_op, vk::AttachmentStoreOp::STORE);

    let depth = description(geometry, "depth");
    assert_eq!(depth.load_op, vk::AttachmentLoadOp::CLEAR);
    assert_eq!(depth.store_op, vk::AttachmentStoreOp::DONT_CARE);
    assert_eq!(depth.final_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    let outgoing = &geometry.description().dependencies;
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].dst_subpass, vk::SUBPASS_EXTERNAL);
    assert_eq!(outgoing[0].dst_stage_mask, vk::PipelineStageFlags::FRAGMENT_SHADER);
    assert_eq!(outgoing[0].dst_access_mask, vk::AccessFlags::SHADER_READ);

    let incoming: Vec<&SubpassDependency> = composite
        .description()
        .dependencies
        .iter()
        .filter(|d| d.src_subpass == vk::SUBPASS_EXTERNAL)
        .collect();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].src_stage_mask, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
    assert_eq!(incoming[0].dst_stage_mask, vk::PipelineStageFlags::FRAGMENT_SHADER);

    assert!(composite.attachments().iter().all(|a| a.name().as_str() != "color"));
    Ok(())
}

#[test]
fn s3_subpass_merge() -> anyhow::Result<()> {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("first")
            .resource(Resource::image("color", ImageAccess::ColorWrite))
            .resource(Resource::image("depth", ImageAccess::DepthStencilRW))
            .auxiliary_order(0)
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("second")
            .resource(Resource::image("color", ImageAccess::ColorRW))
            .resource(Resource::image("depth", ImageAccess::DepthStencilRW))
            .auxiliary_order(1)
            .build(),
    );
    graph.mark_attachment_internal("color", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.mark_attachment_internal("depth", vk::Format::D32_SFLOAT, EXTENT, ClearValue::DepthStencil {
        depth: 1.0,
        stencil: 0,
    });
    graph.build()?;

    let rpis = graph.render_pass_infos();
    assert_eq!(rpis.len(), 1);
    let rp = &rpis[0];
    assert_eq!(rp.subpasses().len(), 2);
    assert_eq!(graph.pass_infos()[0].subpass(), 0);
    assert_eq!(graph.pass_infos()[1].subpass(), 1);

    let internal: Vec<&SubpassDependency> = rp
        .description()
        .dependencies
        .iter()
        .filter(|d| d.src_subpass == 0 && d.dst_subpass == 1)
        .collect();
    assert_eq!(internal.len(), 2);
    assert!(internal.iter().any(|d| {
        d.src_stage_mask == vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            && d.dst_stage_mask == vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            && d.dst_access_mask
                == (vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::COLOR_ATTACHMENT_READ)
    }));
    assert!(internal.iter().any(|d| {
        d.src_stage_mask
            == (vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS)
    }));

    assert_eq!(rp.description().color_refs_for(0).len(), 1);
    assert_eq!(rp.description().color_refs_for(1).len(), 1);
    assert!(rp.description().depth_stencil_ref_for(0).is_some());
    assert!(rp.description().depth_stencil_ref_for(1).is_some());
    Ok(())
}

#[test]
fn s4_rename_keeps_identity() -> anyhow::Result<()> {
    let swapchain = swapchain();
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("produce")
            .resource(Resource::image("img", ImageAccess::ColorWrite).renamed("img_v1"))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("consume")
            .resource(Resource::image("img_v1", ImageAccess::FragmentSampled))
            .resource(Resource::image("swap", ImageAccess::ColorWrite))
            .build(),
    );
    graph.mark_attachment_internal("img", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.bind_attachment_to_swapchain("swap", swapchain, black());
    graph.build()?;

    assert_eq!(graph.resolve_name("img_v1").as_str(), "img");
    assert_eq!(graph.resolve_name(graph.resolve_name("img_v1")).as_str(), "img");

    assert_eq!(graph.pass_infos()[0].name().as_str(), "produce");
    assert_eq!(graph.pass_infos()[1].name().as_str(), "consume");

    let chain = graph.use_chain("img_v1").expect("chain for renamed resource");
    let pass_indices: Vec<Option<usize>> = chain.iter().map(|u| u.pass_index()).collect();
    assert_eq!(pass_indices, vec![None, Some(0), Some(1), None]);
    Ok(())
}

#[test]
fn s5_auxiliary_order_breaks_symmetric_cycles() -> anyhow::Result<()> {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("b")
            .resource(Resource::image("a_out", ImageAccess::ColorRead))
            .resource(Resource::image("b_out", ImageAccess::ColorWrite))
            .auxiliary_order(1)
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("a")
            .resource(Resource::image("b_out", ImageAccess::ColorRead))
            .resource(Resource::image("a_out", ImageAccess::ColorWrite))
            .auxiliary_order(0)
            .build(),
    );
    graph.mark_attachment_internal("a_out", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.mark_attachment_internal("b_out", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.build()?;

    assert_eq!(graph.pass_infos()[0].name().as_str(), "a");
    assert_eq!(graph.pass_infos()[1].name().as_str(), "b");
    Ok(())
}

#[test]
fn s5_equal_orders_are_rejected() {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("a")
            .resource(Resource::image("b_out", ImageAccess::ColorRead))
            .resource(Resource::image("a_out", ImageAccess::ColorWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("b")
            .resource(Resource::image("a_out", ImageAccess::ColorRead))
            .resource(Resource::image("b_out", ImageAccess::ColorWrite))
            .build(),
    );
    graph.mark_attachment_internal("a_out", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.mark_attachment_internal("b_out", vk::Format::R8G8B8A8_SRGB, EXTENT, black());

    assert!(matches!(error_of(graph.build()), Error::UnresolvedCycle(_, _)));
}

#[test]
fn s6_external_attachment_with_explicit_final_use() -> anyhow::Result<()> {
    let view = ImageView::new(
        vk::ImageView::null(),
        vk::Format::R8G8B8A8_UNORM,
        EXTENT,
        vk::ImageAspectFlags::COLOR,
    );
    let initial = Use {
        stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        access: vk::AccessFlags::empty(),
        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    };
    let final_use = Use {
        stages: vk::PipelineStageFlags::FRAGMENT_SHADER,
        access: vk::AccessFlags::SHADER_READ,
        layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    };

    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("draw")
            .resource(Resource::image("target", ImageAccess::ColorWrite))
            .build(),
    );
    graph.bind_attachment_to_image("target", view, initial, final_use);
    graph.build()?;

    let rp = &graph.render_pass_infos()[0];
    let target = description(rp, "target");
    assert_eq!(target.initial_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    assert_eq!(target.load_op, vk::AttachmentLoadOp::LOAD);
    assert_eq!(target.final_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(target.store_op, vk::AttachmentStoreOp::STORE);

    let trailing = rp
        .description()
        .dependencies
        .iter()
        .find(|d| d.dst_subpass == vk::SUBPASS_EXTERNAL)
        .expect("trailing external dependency");
    assert_eq!(trailing.dst_stage_mask, vk::PipelineStageFlags::FRAGMENT_SHADER);
    assert_eq!(trailing.dst_access_mask, vk::AccessFlags::SHADER_READ);
    Ok(())
}

#[test]
fn empty_graph_builds() -> anyhow::Result<()> {
    let mut graph = RenderGraph::new();
    graph.build()?;
    assert!(graph.render_pass_infos().is_empty());
    assert!(graph.pass_infos().is_empty());
    Ok(())
}

#[test]
fn building_twice_is_idempotent() -> anyhow::Result<()> {
    let swapchain = swapchain();
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("geometry")
            .resource(Resource::image("depth", ImageAccess::DepthStencilRW))
            .resource(Resource::image("color", ImageAccess::ColorWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("composite")
            .resource(Resource::image("color", ImageAccess::FragmentSampled))
            .resource(Resource::image("swap", ImageAccess::ColorWrite))
            .build(),
    );
    graph.mark_attachment_internal("depth", vk::Format::D32_SFLOAT, EXTENT, ClearValue::DepthStencil {
        depth: 1.0,
        stencil: 0,
    });
    graph.mark_attachment_internal("color", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.bind_attachment_to_swapchain("swap", swapchain, black());

    graph.build()?;
    let first: Vec<_> = graph.render_pass_infos().iter().map(|rp| rp.description().clone()).collect();
    graph.build()?;
    let second: Vec<_> = graph.render_pass_infos().iter().map(|rp| rp.description().clone()).collect();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn read_after_read_needs_no_sync() -> anyhow::Result<()> {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("produce")
            .resource(Resource::image("img", ImageAccess::ColorWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("reader_one")
            .resource(Resource::image("img", ImageAccess::FragmentSampled))
            .resource(Resource::image("out_one", ImageAccess::ColorWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("reader_two")
            .resource(Resource::image("img", ImageAccess::FragmentSampled))
            .resource(Resource::image("out_two", ImageAccess::ColorWrite))
            .build(),
    );
    graph.mark_attachment_internal("img", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.mark_attachment_internal("out_one", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.mark_attachment_internal("out_two", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.build()?;

    let reader_one = &graph.render_pass_infos()[graph.pass_infos()[1].render_pass_index()];
    let reader_two = &graph.render_pass_infos()[graph.pass_infos()[2].render_pass_index()];

    assert_eq!(reader_one.description().dependencies.len(), 1);
    assert!(reader_two.description().dependencies.is_empty());
    Ok(())
}

#[test]
fn layouts_are_continuous_across_render_passes() -> anyhow::Result<()> {
    let swapchain = swapchain();
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("produce")
            .resource(Resource::image("color", ImageAccess::ColorWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("blend_over")
            .resource(Resource::image("color", ImageAccess::ColorRead))
            .resource(Resource::image("swap", ImageAccess::ColorWrite))
            .build(),
    );
    graph.mark_attachment_internal("color", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.bind_attachment_to_swapchain("swap", swapchain, black());
    graph.build()?;

    let first = &graph.render_pass_infos()[graph.pass_infos()[0].render_pass_index()];
    let second = &graph.render_pass_infos()[graph.pass_infos()[1].render_pass_index()];

    let upstream = description(first, "color");
    let downstream = description(second, "color");
    assert_eq!(upstream.final_layout, downstream.initial_layout);
    assert_eq!(downstream.initial_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    assert_eq!(downstream.load_op, vk::AttachmentLoadOp::LOAD);
    assert_eq!(upstream.store_op, vk::AttachmentStoreOp::STORE);
    Ok(())
}

#[test]
fn buffer_hazards_get_subpass_dependencies() -> anyhow::Result<()> {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("fill")
            .resource(Resource::buffer("data", BufferAccess::StorageWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("consume")
            .resource(Resource::buffer("data", BufferAccess::StorageRead))
            .build(),
    );
    graph.build()?;

    let rpis = graph.render_pass_infos();
    assert_eq!(rpis.len(), 1);
    let rp = &rpis[0];
    assert!(rp.attachments().is_empty());
    assert_eq!(rp.subpasses().len(), 2);

    let deps = &rp.description().dependencies;
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].src_subpass, 0);
    assert_eq!(deps[0].dst_subpass, 1);
    assert_eq!(deps[0].src_access_mask, vk::AccessFlags::SHADER_WRITE);
    assert_eq!(deps[0].dst_access_mask, vk::AccessFlags::SHADER_READ);
    Ok(())
}

#[test]
fn rw_access_lands_in_both_io_sets() -> anyhow::Result<()> {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("accumulate")
            .resource(Resource::image("img", ImageAccess::ColorRW))
            .build(),
    );
    graph.mark_attachment_internal("img", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.build()?;

    let pass = &graph.pass_infos()[0];
    assert!(pass.inputs().iter().any(|r| r.use_name().as_str() == "img"));
    assert!(pass.outputs().iter().any(|r| r.use_name().as_str() == "img"));
    Ok(())
}

#[test]
fn head_tail_and_tracked_classification() -> anyhow::Result<()> {
    let swapchain = swapchain();
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("geometry")
            .resource(Resource::image("depth", ImageAccess::DepthStencilRW))
            .resource(Resource::image("color", ImageAccess::ColorWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("composite")
            .resource(Resource::image("color", ImageAccess::FragmentSampled))
            .resource(Resource::image("swap", ImageAccess::ColorWrite))
            .build(),
    );
    graph.mark_attachment_internal("depth", vk::Format::D32_SFLOAT, EXTENT, ClearValue::DepthStencil {
        depth: 1.0,
        stencil: 0,
    });
    graph.mark_attachment_internal("color", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.bind_attachment_to_swapchain("swap", swapchain, black());
    graph.build()?;

    assert!(graph.pass_infos()[0].is_head());
    assert!(!graph.pass_infos()[0].is_tail());
    assert!(graph.pass_infos()[1].is_tail());

    // Only `color` is produced and consumed inside the graph; `depth` and
    // `swap` escape it and stay global outputs.
    let tracked: Vec<&str> = graph.tracked_resources().iter().map(|r| r.use_name().as_str()).collect();
    assert!(tracked.contains(&"color"));
    assert!(!tracked.contains(&"depth"));
    assert!(!tracked.contains(&"swap"));

    let escaping: Vec<&str> = graph.pass_infos()[0]
        .global_outputs()
        .iter()
        .map(|r| r.use_name().as_str())
        .collect();
    assert_eq!(escaping, vec!["depth"]);
    Ok(())
}

#[test]
fn order_is_a_linear_extension_of_the_dependencies() -> anyhow::Result<()> {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("join")
            .resource(Resource::buffer("b", BufferAccess::StorageRead))
            .resource(Resource::buffer("c", BufferAccess::StorageRead))
            .resource(Resource::buffer("out", BufferAccess::StorageWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("right")
            .resource(Resource::buffer("a", BufferAccess::StorageRead))
            .resource(Resource::buffer("c", BufferAccess::StorageWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("left")
            .resource(Resource::buffer("a", BufferAccess::StorageRead))
            .resource(Resource::buffer("b", BufferAccess::StorageWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("source")
            .resource(Resource::buffer("a", BufferAccess::StorageWrite))
            .build(),
    );
    graph.build()?;

    let position = |name: &str| {
        graph
            .pass_infos()
            .iter()
            .position(|p| p.name().as_str() == name)
            .unwrap()
    };
    assert!(position("source") < position("left"));
    assert!(position("source") < position("right"));
    assert!(position("left") < position("join"));
    assert!(position("right") < position("join"));
    assert!(position("right") < position("left"));
    Ok(())
}

#[test]
fn unknown_input_is_rejected() {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("reader")
            .resource(Resource::image("ghost", ImageAccess::FragmentSampled))
            .build(),
    );
    assert!(matches!(error_of(graph.build()), Error::ResourceNotProduced(name) if name.as_str() == "ghost"));
}

#[test]
fn unbound_attachment_is_rejected() {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("draw")
            .resource(Resource::image("color", ImageAccess::ColorWrite))
            .build(),
    );
    assert!(matches!(error_of(graph.build()), Error::MissingAttachment(name) if name.as_str() == "color"));
}

#[test]
fn conflicting_types_are_rejected() {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("as_image")
            .resource(Resource::image("thing", ImageAccess::ColorWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("as_buffer")
            .resource(Resource::buffer("thing", BufferAccess::StorageRead))
            .build(),
    );
    assert!(matches!(error_of(graph.build()), Error::ResourceTypeMismatch(_)));
}

#[test]
fn split_read_write_declaration_is_rejected() {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("broken")
            .resource(Resource::image("img", ImageAccess::ColorRead))
            .resource(Resource::image("img", ImageAccess::ColorWrite))
            .build(),
    );
    assert!(matches!(error_of(graph.build()), Error::ContractViolation(_)));
}

#[test]
fn mismatched_extents_are_rejected() {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("draw")
            .resource(Resource::image("color", ImageAccess::ColorWrite))
            .resource(Resource::image("depth", ImageAccess::DepthStencilRW))
            .build(),
    );
    graph.mark_attachment_internal("color", vk::Format::R8G8B8A8_SRGB, EXTENT, black());
    graph.mark_attachment_internal(
        "depth",
        vk::Format::D32_SFLOAT,
        vk::Extent2D {
            width: 640,
            height: 360,
        },
        ClearValue::DepthStencil {
            depth: 1.0,
            stencil: 0,
        },
    );
    assert!(matches!(error_of(graph.build()), Error::ContractViolation(_)));
}

#[test]
fn disagreeing_queue_families_are_rejected() {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("fill")
            .resource(Resource::buffer("data", BufferAccess::StorageWrite))
            .queue_family(0)
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("consume")
            .resource(Resource::buffer("data", BufferAccess::StorageRead))
            .queue_family(1)
            .build(),
    );
    assert!(matches!(error_of(graph.build()), Error::ContractViolation(_)));
}

#[test]
fn graphviz_export_names_all_passes() -> anyhow::Result<()> {
    let mut graph = RenderGraph::new();
    graph.add_pass(
        PassBuilder::new("fill")
            .resource(Resource::buffer("data", BufferAccess::StorageWrite))
            .build(),
    );
    graph.add_pass(
        PassBuilder::new("consume")
            .resource(Resource::buffer("data", BufferAccess::StorageRead))
            .build(),
    );
    graph.build()?;

    let dot = graph.dot()?;
    assert!(dot.contains("fill"));
    assert!(dot.contains("consume"));
    Ok(())
}
