//! The render graph compiler: declaration API, pass ordering, use chain
//! assembly and render pass grouping.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use anyhow::Result;
use ash::vk;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::DiGraph;

use crate::core::device::Device;
use crate::core::error::Error;
use crate::core::name::Name;
use crate::graph::attachment::{AttachmentInfo, AttachmentKind, ClearValue, SwapchainRef};
use crate::graph::pass::Pass;
use crate::graph::resource::{Resource, ResourceType, Use, UseChain, UseRef};
use crate::graph::sync::{AttachmentDescription, RenderPassDescription};
use crate::graph::{physical, record, sync};
use crate::resource::image::ImageView;
use crate::resource::pool::FrameResources;

/// Per-pass state derived by [`RenderGraph::build`].
#[derive(Debug)]
pub struct PassInfo<'cb> {
    pub(crate) pass: Pass<'cb>,
    pub(crate) inputs: Vec<Resource>,
    pub(crate) outputs: Vec<Resource>,
    pub(crate) global_inputs: Vec<Resource>,
    pub(crate) global_outputs: Vec<Resource>,
    pub(crate) render_pass_index: usize,
    pub(crate) subpass: u32,
    pub(crate) is_head: bool,
    pub(crate) is_tail: bool,
}

impl<'cb> PassInfo<'cb> {
    fn new(pass: Pass<'cb>) -> Self {
        Self {
            pass,
            inputs: Vec::new(),
            outputs: Vec::new(),
            global_inputs: Vec::new(),
            global_outputs: Vec::new(),
            render_pass_index: usize::MAX,
            subpass: 0,
            is_head: false,
            is_tail: false,
        }
    }

    fn reset_derived(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
        self.global_inputs.clear();
        self.global_outputs.clear();
        self.render_pass_index = usize::MAX;
        self.subpass = 0;
        self.is_head = false;
        self.is_tail = false;
    }

    /// The declared pass.
    pub fn pass(&self) -> &Pass<'cb> {
        &self.pass
    }

    /// Name of the declared pass.
    pub fn name(&self) -> &Name {
        &self.pass.name
    }

    /// Resources this pass consumes.
    pub fn inputs(&self) -> &[Resource] {
        &self.inputs
    }

    /// Resources this pass produces.
    pub fn outputs(&self) -> &[Resource] {
        &self.outputs
    }

    /// Inputs of this pass that no pass of the graph produces.
    pub fn global_inputs(&self) -> &[Resource] {
        &self.global_inputs
    }

    /// Outputs of this pass that no pass of the graph consumes.
    pub fn global_outputs(&self) -> &[Resource] {
        &self.global_outputs
    }

    /// Index of the render pass group this pass was assigned to.
    pub fn render_pass_index(&self) -> usize {
        self.render_pass_index
    }

    /// Subpass index inside the render pass group.
    pub fn subpass(&self) -> u32 {
        self.subpass
    }

    /// Whether every input of this pass is a graph input.
    pub fn is_head(&self) -> bool {
        self.is_head
    }

    /// Whether every output of this pass is a graph output.
    pub fn is_tail(&self) -> bool {
        self.is_tail
    }
}

/// One subpass inside a render pass group.
#[derive(Debug, Copy, Clone)]
pub struct SubpassInfo {
    pub(crate) pass_index: usize,
}

impl SubpassInfo {
    /// Index into [`RenderGraph::pass_infos`] of the pass executing in this subpass.
    pub fn pass_index(&self) -> usize {
        self.pass_index
    }
}

/// State of one attachment inside one render pass group.
#[derive(Debug, Clone)]
pub struct RenderPassAttachment {
    pub(crate) name: Name,
    pub(crate) kind: AttachmentKind,
    pub(crate) description: AttachmentDescription,
    pub(crate) extent: vk::Extent2D,
    pub(crate) clear_value: Option<ClearValue>,
    pub(crate) should_clear: bool,
}

impl RenderPassAttachment {
    fn new(name: Name) -> Self {
        Self {
            name,
            kind: AttachmentKind::Internal,
            description: AttachmentDescription::default(),
            extent: vk::Extent2D::default(),
            clear_value: None,
            should_clear: false,
        }
    }

    pub(crate) fn populate(&mut self, info: &AttachmentInfo) {
        self.description.format = info.format;
        self.description.samples = info.samples;
        self.extent = info.extent;
        self.clear_value = info.clear_value;
        self.should_clear = info.should_clear;
        self.kind = info.kind.clone();
    }

    /// Canonical name of the bound resource.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The lowered attachment description.
    pub fn description(&self) -> &AttachmentDescription {
        &self.description
    }

    /// Size of the backing image.
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Whether the attachment is cleared on load.
    pub fn should_clear(&self) -> bool {
        self.should_clear
    }
}

/// One render pass group: passes sharing a framebuffer attachment set,
/// realized as a single `VkRenderPass` with one subpass per member.
#[derive(Debug, Default)]
pub struct RenderPassInfo {
    pub(crate) subpasses: Vec<SubpassInfo>,
    pub(crate) attachments: Vec<RenderPassAttachment>,
    pub(crate) description: RenderPassDescription,
    pub(crate) handle: vk::RenderPass,
    pub(crate) framebuffer: vk::Framebuffer,
}

impl RenderPassInfo {
    pub(crate) fn attachment_mut(&mut self, name: &Name) -> Option<&mut RenderPassAttachment> {
        self.attachments.iter_mut().find(|a| &a.name == name)
    }

    pub(crate) fn attachment_index(&self, name: &Name) -> Option<usize> {
        self.attachments.iter().position(|a| &a.name == name)
    }

    /// The subpasses of this render pass, in execution order.
    pub fn subpasses(&self) -> &[SubpassInfo] {
        &self.subpasses
    }

    /// The attachments of this render pass. Indices into this slice define
    /// the attachment indices of the description.
    pub fn attachments(&self) -> &[RenderPassAttachment] {
        &self.attachments
    }

    /// The lowered render pass description.
    pub fn description(&self) -> &RenderPassDescription {
        &self.description
    }

    /// The acquired render pass handle. Null until `execute` ran.
    pub fn handle(&self) -> vk::RenderPass {
        self.handle
    }

    /// The acquired framebuffer. Null until `execute` ran.
    pub fn framebuffer(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

pub(crate) fn resolve_name(aliases: &HashMap<Name, Name>, name: &Name) -> Name {
    let mut current = name;
    while let Some(next) = aliases.get(current) {
        current = next;
    }
    current.clone()
}

fn feeds<'a>(producer: &'a PassInfo, consumer: &PassInfo) -> Option<&'a Name> {
    producer.outputs.iter().map(|output| &output.use_name).find(|name| {
        consumer
            .inputs
            .iter()
            .any(|input| &input.src_name == *name || &input.use_name == *name)
    })
}

/// Declarative description of a frame, compiled into render passes with full
/// synchronization state and recorded into a command buffer.
///
/// Passes and attachment bindings are appended first, then [`RenderGraph::build`]
/// derives all scheduling state, and [`RenderGraph::execute`] realizes the
/// graph against concrete frame resources. See the
/// [module documentation](crate::graph) for a walkthrough.
#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct RenderGraph<'cb> {
    passes: Vec<PassInfo<'cb>>,
    bound_attachments: BTreeMap<Name, AttachmentInfo>,
    #[derivative(Debug = "ignore")]
    aliases: HashMap<Name, Name>,
    #[derivative(Debug = "ignore")]
    chains: BTreeMap<Name, UseChain>,
    rpis: Vec<RenderPassInfo>,
    tracked: Vec<Resource>,
    built: bool,
}

impl<'cb> RenderGraph<'cb> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pass to the graph. Declaration order is preserved for passes that
    /// the dependency relation leaves unordered.
    pub fn add_pass(&mut self, pass: Pass<'cb>) {
        self.passes.push(PassInfo::new(pass));
        self.built = false;
    }

    /// Bind an attachment to a swapchain. The attachment is cleared on first
    /// use and handed to the presentation engine after its last use.
    pub fn bind_attachment_to_swapchain(&mut self, name: impl Into<Name>, swapchain: SwapchainRef, clear: ClearValue) {
        self.bound_attachments.insert(name.into(), AttachmentInfo::swapchain(swapchain, clear));
        self.built = false;
    }

    /// Mark an attachment as internal. A transient image of the given format
    /// and extent is created for every execution, cleared on first use and
    /// abandoned after the last.
    pub fn mark_attachment_internal(&mut self, name: impl Into<Name>, format: vk::Format, extent: vk::Extent2D, clear: ClearValue) {
        self.bound_attachments.insert(name.into(), AttachmentInfo::internal(format, extent, clear));
        self.built = false;
    }

    /// Bind an attachment to an externally owned image. `initial` describes
    /// the state the image is in when the graph starts using it, `final_use`
    /// the state the caller wants it left in.
    pub fn bind_attachment_to_image(&mut self, name: impl Into<Name>, view: ImageView, initial: Use, final_use: Use) {
        self.bound_attachments.insert(name.into(), AttachmentInfo::external(view, initial, final_use));
        self.built = false;
    }

    /// Compile the graph: classify pass inputs and outputs, order passes,
    /// resolve rename chains, group passes into render passes and lower all
    /// synchronization state.
    ///
    /// Building twice without changing the declarations produces identical
    /// render pass descriptions.
    /// # Errors
    /// The first structural error aborts the build and leaves no derived
    /// state visible.
    pub fn build(&mut self) -> Result<()> {
        self.reset_derived();
        self.check_declarations()?;
        self.build_io();
        self.sort_passes()?;
        self.mark_head_tail();
        self.build_chains()?;
        self.rekey_attachments()?;
        self.validate_produced()?;
        self.group_render_passes()?;
        sync::lower(&self.passes, &self.bound_attachments, &mut self.chains, &mut self.rpis)?;
        trace!(
            "compiled graph: {} passes in {} render passes",
            self.passes.len(),
            self.rpis.len()
        );
        self.built = true;
        Ok(())
    }

    /// Realize the compiled graph for one frame and record it.
    ///
    /// Transient images are created through `frame`, render passes and
    /// framebuffers are acquired from its caches, and every pass executor is
    /// invoked inside its subpass. Swapchain attachments pick their image from
    /// the matching `(swapchain, image index)` acquisition. On error, every
    /// object acquired so far is returned to `frame` before this call returns.
    pub fn execute(
        &mut self,
        device: &Device,
        frame: &mut dyn FrameResources,
        swapchains: &[(SwapchainRef, u32)],
    ) -> Result<vk::CommandBuffer> {
        if !self.built {
            return Err(Error::NotBuilt.into());
        }
        let queue_family = self.passes.first().map(|p| p.pass.queue_family).unwrap_or(0);
        let Self {
            passes,
            bound_attachments,
            aliases,
            chains,
            rpis,
            ..
        } = self;
        let mut scope = physical::FrameScope::new(frame);
        physical::realize_attachments(bound_attachments, chains, swapchains, &mut scope)?;
        physical::realize_framebuffers(rpis, bound_attachments, &mut scope)?;
        let cmd = record::record_graph(device, passes, rpis, bound_attachments, aliases, &mut scope, queue_family)?;
        scope.finish();
        Ok(cmd)
    }

    /// The declared passes with their derived state, in execution order once
    /// the graph is built.
    pub fn pass_infos(&self) -> &[PassInfo<'cb>] {
        &self.passes
    }

    /// The render pass groups derived by the last build.
    pub fn render_pass_infos(&self) -> &[RenderPassInfo] {
        &self.rpis
    }

    /// Outputs that never leave the graph.
    pub fn tracked_resources(&self) -> &[Resource] {
        &self.tracked
    }

    /// Follow the rename chain of a name to its canonical resource key.
    pub fn resolve_name(&self, name: impl Into<Name>) -> Name {
        resolve_name(&self.aliases, &name.into())
    }

    /// The use chain of a resource, bracketed by its attachment endpoints.
    pub fn use_chain(&self, name: impl Into<Name>) -> Option<&[UseRef]> {
        let key = self.resolve_name(name);
        self.chains.get(&key).map(|chain| chain.uses.as_slice())
    }

    /// The bound attachment backing a name, if any.
    pub fn attachment(&self, name: impl Into<Name>) -> Option<&AttachmentInfo> {
        let key = self.resolve_name(name);
        self.bound_attachments.get(&key)
    }

    pub(crate) fn dependency_edges(&self) -> Vec<(usize, usize, &Name)> {
        let mut edges = Vec::new();
        for i in 0..self.passes.len() {
            for j in 0..self.passes.len() {
                if i == j {
                    continue;
                }
                if let Some(name) = feeds(&self.passes[i], &self.passes[j]) {
                    edges.push((i, j, name));
                }
            }
        }
        edges
    }

    fn reset_derived(&mut self) {
        self.aliases.clear();
        self.chains.clear();
        self.rpis.clear();
        self.tracked.clear();
        self.built = false;
        for pif in &mut self.passes {
            pif.reset_derived();
        }
    }

    fn check_declarations(&self) -> Result<()> {
        let mut types: HashMap<&Name, ResourceType> = HashMap::new();
        for name in self.bound_attachments.keys() {
            types.insert(name, ResourceType::Image);
        }
        for pif in &self.passes {
            let mut declared: HashSet<&Name> = HashSet::new();
            for res in &pif.pass.resources {
                if !declared.insert(&res.use_name) {
                    return Err(Error::ContractViolation(
                        "a pass declares the same resource version twice; use a read-write access instead",
                    )
                    .into());
                }
                for name in [&res.src_name, &res.use_name] {
                    match types.insert(name, res.resource_type()) {
                        Some(previous) if previous != res.resource_type() => {
                            return Err(Error::ResourceTypeMismatch((*name).clone()).into());
                        }
                        _ => {}
                    }
                }
            }
        }
        if let Some(first) = self.passes.first() {
            if self.passes.iter().any(|p| p.pass.queue_family != first.pass.queue_family) {
                return Err(Error::ContractViolation("all passes of a graph must target the same queue family").into());
            }
        }
        Ok(())
    }

    // Split each pass's resources into consumed and produced sets, and cancel
    // matched producer/consumer pairs against the running global frontier.
    fn build_io(&mut self) {
        let mut global_inputs: HashSet<Name> = HashSet::new();
        let mut global_outputs: HashSet<Name> = HashSet::new();
        for pif in &mut self.passes {
            pif.inputs = pif.pass.resources.iter().filter(|r| r.is_read()).cloned().collect();
            pif.outputs = pif.pass.resources.iter().filter(|r| r.is_write()).cloned().collect();

            for input in &pif.inputs {
                if !global_outputs.remove(&input.src_name) {
                    pif.global_inputs.push(input.clone());
                }
            }
            for output in &pif.outputs {
                if !global_inputs.remove(&output.use_name) {
                    pif.global_outputs.push(output.clone());
                }
            }

            global_inputs.extend(pif.global_inputs.iter().map(|r| r.src_name.clone()));
            global_outputs.extend(pif.global_outputs.iter().map(|r| r.use_name.clone()));
        }

        // A later pass may have cancelled a resource an earlier pass saw as
        // escaping; the per-pass classification must match the final frontier.
        for pif in &mut self.passes {
            pif.global_inputs.retain(|r| global_inputs.contains(&r.src_name));
            pif.global_outputs.retain(|r| global_outputs.contains(&r.use_name));
        }

        let mut seen: HashSet<Name> = HashSet::new();
        self.tracked = self
            .passes
            .iter()
            .flat_map(|p| p.outputs.iter())
            .filter(|o| !global_outputs.contains(&o.use_name) && seen.insert(o.use_name.clone()))
            .cloned()
            .collect();
    }

    // Order passes so that every consumer follows its producers. Mutual
    // producer/consumer pairs are broken by auxiliary order; everything the
    // relation leaves unordered keeps declaration order.
    fn sort_passes(&mut self) -> Result<()> {
        let count = self.passes.len();
        if count <= 1 {
            return Ok(());
        }

        let mut edges: Vec<(usize, usize)> = Vec::new();
        for i in 0..count {
            for j in (i + 1)..count {
                let forward = feeds(&self.passes[i], &self.passes[j]).is_some();
                let backward = feeds(&self.passes[j], &self.passes[i]).is_some();
                match (forward, backward) {
                    (true, true) => {
                        let (a, b) = (&self.passes[i].pass, &self.passes[j].pass);
                        if a.auxiliary_order == b.auxiliary_order {
                            return Err(Error::UnresolvedCycle(a.name.clone(), b.name.clone()).into());
                        }
                        if a.auxiliary_order < b.auxiliary_order {
                            edges.push((i, j));
                        } else {
                            edges.push((j, i));
                        }
                    }
                    (true, false) => edges.push((i, j)),
                    (false, true) => edges.push((j, i)),
                    (false, false) => {}
                }
            }
        }

        let mut graph = DiGraph::<usize, ()>::new();
        let nodes: Vec<_> = (0..count).map(|i| graph.add_node(i)).collect();
        for &(from, to) in &edges {
            graph.add_edge(nodes[from], nodes[to], ());
        }
        if let Err(cycle) = toposort(&graph, None) {
            let node = cycle.node_id();
            let first = graph[node];
            let second = graph
                .neighbors(node)
                .find(|&n| has_path_connecting(&graph, n, node, None))
                .map(|n| graph[n])
                .unwrap_or(first);
            return Err(Error::UnresolvedCycle(
                self.passes[first].pass.name.clone(),
                self.passes[second].pass.name.clone(),
            )
            .into());
        }

        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); count];
        for &(from, to) in &edges {
            predecessors[to].push(from);
        }
        let mut placed = vec![false; count];
        let mut order = Vec::with_capacity(count);
        while order.len() < count {
            let next = (0..count)
                .find(|&i| !placed[i] && predecessors[i].iter().all(|&p| placed[p]))
                .expect("acyclic after cycle check");
            placed[next] = true;
            order.push(next);
        }

        let mut taken: Vec<Option<PassInfo<'cb>>> = self.passes.drain(..).map(Some).collect();
        self.passes = order.into_iter().map(|i| taken[i].take().expect("permutation")).collect();
        Ok(())
    }

    // Head and tail passes touch only global io; they can execute at the very
    // beginning or end of the graph.
    fn mark_head_tail(&mut self) {
        for pif in &mut self.passes {
            pif.is_head = pif.global_inputs.len() == pif.inputs.len();
            pif.is_tail = pif.global_outputs.len() == pif.outputs.len();
        }
    }

    fn build_chains(&mut self) -> Result<()> {
        let Self {
            passes,
            aliases,
            chains,
            ..
        } = self;
        for (index, pif) in passes.iter().enumerate() {
            for res in &pif.pass.resources {
                if res.src_name != res.use_name {
                    aliases.insert(res.use_name.clone(), res.src_name.clone());
                }
                let key = resolve_name(aliases, &res.use_name);
                let chain = chains.entry(key.clone()).or_insert_with(|| UseChain {
                    ty: res.resource_type(),
                    uses: Vec::new(),
                });
                if chain.ty != res.resource_type() {
                    return Err(Error::ResourceTypeMismatch(key).into());
                }
                chain.uses.push(UseRef {
                    usage: res.to_use(),
                    pass: Some(index),
                });
            }
        }
        Ok(())
    }

    fn rekey_attachments(&mut self) -> Result<()> {
        let mut rekeyed = BTreeMap::new();
        for (name, info) in std::mem::take(&mut self.bound_attachments) {
            let key = resolve_name(&self.aliases, &name);
            if rekeyed.insert(key, info).is_some() {
                return Err(Error::ContractViolation("multiple attachments bound to the same resource").into());
            }
        }
        self.bound_attachments = rekeyed;
        Ok(())
    }

    fn validate_produced(&self) -> Result<()> {
        let produced: HashSet<&Name> = self
            .passes
            .iter()
            .flat_map(|p| p.outputs.iter().map(|o| &o.use_name))
            .collect();
        for pif in &self.passes {
            for input in &pif.inputs {
                if produced.contains(&input.src_name) {
                    continue;
                }
                let key = resolve_name(&self.aliases, &input.src_name);
                if !self.bound_attachments.contains_key(&key) {
                    return Err(Error::ResourceNotProduced(input.src_name.clone()).into());
                }
            }
        }
        Ok(())
    }

    // Passes sharing the same framebuffer attachment set merge into one
    // render pass, in iteration order; each member becomes a subpass.
    fn group_render_passes(&mut self) -> Result<()> {
        let Self {
            passes,
            aliases,
            bound_attachments,
            rpis,
            ..
        } = self;

        let mut groups: Vec<(BTreeSet<Name>, Vec<usize>)> = Vec::new();
        for (index, pif) in passes.iter().enumerate() {
            let atts: BTreeSet<Name> = pif
                .pass
                .resources
                .iter()
                .filter(|r| r.is_framebuffer_attachment())
                .map(|r| resolve_name(aliases, &r.use_name))
                .collect();
            match groups.iter_mut().find(|(set, _)| *set == atts) {
                Some((_, members)) => members.push(index),
                None => groups.push((atts, vec![index])),
            }
        }

        for (_, members) in groups {
            let rpi_index = rpis.len();
            let mut rpi = RenderPassInfo::default();
            let mut names: Vec<Name> = Vec::new();
            for (subpass, &pass_index) in members.iter().enumerate() {
                passes[pass_index].render_pass_index = rpi_index;
                passes[pass_index].subpass = subpass as u32;
                rpi.subpasses.push(SubpassInfo {
                    pass_index,
                });
                for res in &passes[pass_index].pass.resources {
                    if res.is_framebuffer_attachment() {
                        let name = resolve_name(aliases, &res.use_name);
                        if !names.contains(&name) {
                            names.push(name);
                        }
                    }
                }
            }

            let mut extent: Option<vk::Extent2D> = None;
            for name in &names {
                let info = bound_attachments
                    .get(name)
                    .ok_or_else(|| Error::MissingAttachment(name.clone()))?;
                match extent {
                    None => extent = Some(info.extent),
                    Some(expected) if expected != info.extent => {
                        return Err(Error::ContractViolation(
                            "framebuffer attachments of one render pass must have matching extents",
                        )
                        .into());
                    }
                    _ => {}
                }
            }

            rpi.attachments = names.into_iter().map(RenderPassAttachment::new).collect();
            rpis.push(rpi);
        }
        Ok(())
    }
}
