use std::collections::HashMap;

use log::{debug, warn};

use super::simulation::{ForceConfig, SimLink, SimNode, Simulation};
use super::style::{LinkStyle, NodeStyle};
use super::types::{GraphData, GraphNode};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 5.0;
const INITIAL_ZOOM: f64 = 0.8;
pub const WARMUP_STEPS: usize = 50;
pub const FOCAL_LOCK_MS: i32 = 3000;
/// Screen-space travel below which a press counts as a click.
const CLICK_TOLERANCE: f64 = 3.0;

#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub node: GraphNode,
	pub style: NodeStyle,
}

#[derive(Clone, Debug)]
pub struct LinkInfo {
	pub source: usize,
	pub target: usize,
	pub style: LinkStyle,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct ViewState {
	pub selected: Option<usize>,
	pub transform: ViewTransform,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
}

pub struct ForceGraphState {
	pub nodes: Vec<NodeInfo>,
	pub links: Vec<LinkInfo>,
	pub sim_nodes: Vec<SimNode>,
	sim_links: Vec<SimLink>,
	pub simulation: Simulation,
	pub view: ViewState,
	pub drag: DragState,
	pub pan: PanState,
	pub hovered: Option<usize>,
	pub width: f64,
	pub height: f64,
	focal_lock: Option<usize>,
	/// View changed since the last frame was drawn.
	dirty: bool,
}

impl ForceGraphState {
	pub fn new(data: &GraphData, focal: &str, width: f64, height: f64) -> Self {
		let data = data.with_focal_node(focal);
		if let Err(err) = data.validate() {
			warn!("Fund-flow graph failed validation, skipping bad entries: {err}");
		}

		let mut id_to_idx = HashMap::new();
		let mut nodes = Vec::with_capacity(data.nodes.len());
		for node in &data.nodes {
			if id_to_idx.contains_key(&node.id) {
				warn!("Dropping duplicate node {}", node.id);
				continue;
			}
			id_to_idx.insert(node.id.clone(), nodes.len());
			nodes.push(NodeInfo {
				style: NodeStyle::of(node),
				node: node.clone(),
			});
		}

		let config = ForceConfig::default();
		let mut links = Vec::with_capacity(data.links.len());
		let mut sim_links = Vec::with_capacity(data.links.len());
		for link in &data.links {
			let (Some(&src), Some(&tgt)) =
				(id_to_idx.get(&link.source), id_to_idx.get(&link.target))
			else {
				warn!("Skipping link {} -> {}: endpoint missing", link.source, link.target);
				continue;
			};
			let (src_risk, tgt_risk) = (nodes[src].node.risk_score, nodes[tgt].node.risk_score);
			links.push(LinkInfo {
				source: src,
				target: tgt,
				style: LinkStyle::of(src_risk, tgt_risk, link.weight),
			});
			sim_links.push(SimLink {
				source: src,
				target: tgt,
				distance: config.link_distance(src_risk, tgt_risk),
			});
		}

		let mut sim_nodes: Vec<SimNode> =
			nodes.iter().map(|n| SimNode::new(n.style.radius)).collect();
		let focal_lock = id_to_idx.get(focal).copied();
		if let Some(idx) = focal_lock {
			sim_nodes[idx].pin(0.0, 0.0);
		}

		let mut simulation = Simulation::new(config, &mut sim_nodes, &sim_links);
		let reset = simulation.warm_up(&mut sim_nodes, &sim_links, WARMUP_STEPS);
		if reset > 0 {
			warn!("Reset {reset} diverged node positions during warm-up");
		}
		debug!(
			"Mounted fund-flow graph: {} nodes, {} links",
			nodes.len(),
			links.len()
		);

		Self {
			nodes,
			links,
			sim_nodes,
			sim_links,
			simulation,
			view: ViewState {
				selected: None,
				transform: ViewTransform {
					x: width / 2.0,
					y: height / 2.0,
					k: INITIAL_ZOOM,
				},
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hovered: None,
			width,
			height,
			focal_lock,
			dirty: true,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		let t = &self.view.transform;
		((sx - t.x) / t.k, (sy - t.y) / t.k)
	}

	/// Topmost node under a screen point; later nodes draw on top.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.sim_nodes.iter().enumerate().rev().find_map(|(idx, node)| {
			let (x, y) = node.position();
			let (dx, dy) = (x - gx, y - gy);
			(dx * dx + dy * dy <= node.radius * node.radius).then_some(idx)
		})
	}

	pub fn selected(&self) -> Option<&GraphNode> {
		self.view.selected.and_then(|idx| self.nodes.get(idx)).map(|n| &n.node)
	}

	pub fn select(&mut self, idx: usize) {
		if idx < self.nodes.len() {
			self.view.selected = Some(idx);
			self.dirty = true;
		}
	}

	pub fn clear_selection(&mut self) {
		self.dirty |= self.view.selected.take().is_some();
	}

	pub fn has_focal_lock(&self) -> bool {
		self.focal_lock.is_some()
	}

	/// End the initial anchoring of the focal node.
	pub fn release_focal(&mut self) {
		let Some(idx) = self.focal_lock.take() else {
			return;
		};
		if self.drag.node_idx != Some(idx) && self.sim_nodes[idx].is_pinned() {
			self.sim_nodes[idx].unpin();
			self.dirty = true;
			debug!("Released focal node {}", self.nodes[idx].node.id);
		}
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			let (nx, ny) = self.sim_nodes[idx].position();
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				node_start_x: nx,
				node_start_y: ny,
				moved: false,
			};
			if self.focal_lock == Some(idx) {
				self.focal_lock = None;
			}
			self.sim_nodes[idx].pin(nx, ny);
			let target = self.simulation.config().drag_alpha_target;
			self.simulation.set_alpha_target(target);
			self.simulation.restart();
		} else {
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: self.view.transform.x,
				transform_start_y: self.view.transform.y,
				moved: false,
			};
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.dirty |= hovered != self.hovered;
			self.hovered = hovered;
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			let (dx, dy) = (x - self.drag.start_x, y - self.drag.start_y);
			self.drag.moved |= dx.hypot(dy) > CLICK_TOLERANCE;
			if self.drag.moved {
				let k = self.view.transform.k;
				let (nx, ny) = (self.drag.node_start_x + dx / k, self.drag.node_start_y + dy / k);
				self.sim_nodes[idx].pin(nx, ny);
			}
		} else if self.pan.active {
			let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
			self.pan.moved |= dx.hypot(dy) > CLICK_TOLERANCE;
			if self.pan.moved {
				self.view.transform.x = self.pan.transform_start_x + dx;
				self.view.transform.y = self.pan.transform_start_y + dy;
				self.dirty = true;
			}
		}
	}

	/// Finish a press. A press that never moved is a click on the node or
	/// on the background. Returns true when the selection changed.
	pub fn pointer_up(&mut self) -> bool {
		let before = self.view.selected;
		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				self.sim_nodes[idx].unpin();
				self.simulation.set_alpha_target(0.0);
				if !self.drag.moved {
					self.select(idx);
				}
			}
		} else if self.pan.active && !self.pan.moved {
			self.clear_selection();
		}
		self.end_gesture();
		before != self.view.selected
	}

	pub fn pointer_leave(&mut self) {
		self.dirty |= self.hovered.is_some();
		if let Some(idx) = self.drag.node_idx.filter(|_| self.drag.active) {
			self.sim_nodes[idx].unpin();
			self.simulation.set_alpha_target(0.0);
		}
		self.end_gesture();
		self.hovered = None;
	}

	fn end_gesture(&mut self) {
		self.drag = DragState::default();
		self.pan = PanState::default();
	}

	/// Zoom by `factor` keeping the screen point under the cursor fixed.
	pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
		let t = &mut self.view.transform;
		let new_k = (t.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / t.k;
		t.x = x - (x - t.x) * ratio;
		t.y = y - (y - t.y) * ratio;
		t.k = new_k;
		self.dirty = true;
	}

	pub fn cursor(&self) -> &'static str {
		if self.drag.active || self.pan.moved {
			"grabbing"
		} else if self.hovered.is_some() {
			"pointer"
		} else {
			"grab"
		}
	}

	/// Advance the layout one frame. Returns whether the canvas needs a redraw.
	pub fn tick(&mut self) -> bool {
		let was_running = self.simulation.is_running();
		let reset = self.simulation.step(&mut self.sim_nodes, &self.sim_links);
		if reset > 0 {
			warn!("Reset {reset} diverged node positions to the graph center");
		}
		if was_running && self.simulation.is_settled() {
			debug!("Layout settled (alpha {:.4})", self.simulation.alpha());
		}
		let dirty = std::mem::take(&mut self.dirty);
		was_running || dirty
	}

	pub fn stop(&mut self) {
		self.simulation.stop();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.dirty = true;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::style::{FLAGGED_STROKE, HIGH_COLOR, LOW_COLOR};
	use crate::components::force_graph::types::{AccountType, GraphLink, RiskFlags};

	fn node(id: &str, kind: AccountType, score: f64, flagged: bool) -> GraphNode {
		GraphNode {
			id: id.into(),
			label: id.into(),
			kind,
			risk_score: score,
			flags: [("ofac", flagged), ("hacker", false)].into_iter().collect(),
		}
	}

	fn link(source: &str, target: &str) -> GraphLink {
		GraphLink {
			source: source.into(),
			target: target.into(),
			weight: 1.0,
		}
	}

	fn scenario() -> GraphData {
		let mut dex = node("0xB", AccountType::Contract, 5.0, false);
		dex.label = "Known DEX".into();
		dex.flags = RiskFlags::default();
		GraphData {
			nodes: vec![node("0xA", AccountType::Eoa, 150.0, true), dex],
			links: vec![link("0xMAIN", "0xA"), link("0xMAIN", "0xB")],
		}
	}

	fn to_screen(state: &ForceGraphState, gx: f64, gy: f64) -> (f64, f64) {
		let t = &state.view.transform;
		(gx * t.k + t.x, gy * t.k + t.y)
	}

	/// Spread nodes far apart so hit tests are unambiguous.
	fn spread(state: &mut ForceGraphState) {
		for (i, node) in state.sim_nodes.iter_mut().enumerate() {
			node.x = i as f64 * 1000.0;
			node.y = 0.0;
		}
	}

	fn click_node(state: &mut ForceGraphState, idx: usize) -> bool {
		let (x, y) = state.sim_nodes[idx].position();
		let (sx, sy) = to_screen(state, x, y);
		state.pointer_down(sx, sy);
		state.pointer_up()
	}

	fn click_background(state: &mut ForceGraphState) -> bool {
		let (sx, sy) = to_screen(state, 500.0, 5000.0);
		state.pointer_down(sx, sy);
		state.pointer_up()
	}

	#[test]
	fn scenario_mounts_with_hub_and_styles() {
		let state = ForceGraphState::new(&scenario(), "0xMAIN", 600.0, 500.0);
		assert_eq!(state.nodes.len(), 3);
		assert_eq!(state.links.len(), 2);
		assert_eq!(state.nodes[0].node.id, "0xMAIN");
		assert!(state.links.iter().all(|l| l.source == 0));

		let a = &state.nodes[1].style;
		assert_eq!(a.fill, HIGH_COLOR);
		assert_eq!(a.stroke, FLAGGED_STROKE);
		assert!(a.halo.is_some());

		let b = &state.nodes[2].style;
		assert_eq!(b.fill, LOW_COLOR);
		assert!(b.contract_ring.is_some());
		assert!(b.halo.is_none());
		assert_eq!(b.label, "Known DEX");
	}

	#[test]
	fn focal_node_is_anchored_then_released() {
		let mut state = ForceGraphState::new(&scenario(), "0xMAIN", 600.0, 500.0);
		assert!(state.has_focal_lock());
		assert_eq!(state.sim_nodes[0].position(), (0.0, 0.0));
		assert!(state.sim_nodes[0].is_pinned());

		state.release_focal();
		assert!(!state.has_focal_lock());
		assert!(!state.sim_nodes[0].is_pinned());
		state.release_focal();
	}

	#[test]
	fn empty_graph_is_idle() {
		let mut state = ForceGraphState::new(&GraphData::default(), "0xMAIN", 600.0, 500.0);
		assert!(state.is_empty());
		assert!(!state.has_focal_lock());
		state.tick();
		assert_eq!(state.node_at_position(300.0, 250.0), None);
		assert!(!click_background(&mut state));
	}

	#[test]
	fn dangling_links_are_skipped() {
		let mut data = scenario();
		data.links.push(link("0xMAIN", "0xGONE"));
		data.nodes.push(node("0xA", AccountType::Eoa, 1.0, false));
		let state = ForceGraphState::new(&data, "0xMAIN", 600.0, 500.0);
		assert_eq!(state.nodes.len(), 3);
		assert_eq!(state.links.len(), 2);
		assert_eq!(state.nodes[1].node.risk_score, 150.0);
	}

	#[test]
	fn selection_lifecycle() {
		let mut state = ForceGraphState::new(&scenario(), "0xMAIN", 600.0, 500.0);
		spread(&mut state);

		assert!(click_node(&mut state, 1));
		assert_eq!(state.selected().map(|n| n.id.as_str()), Some("0xA"));

		assert!(click_background(&mut state));
		assert!(state.selected().is_none());

		click_node(&mut state, 1);
		assert!(click_node(&mut state, 2));
		assert_eq!(state.view.selected, Some(2));
	}

	#[test]
	fn dragging_moves_only_the_node() {
		let mut state = ForceGraphState::new(&scenario(), "0xMAIN", 600.0, 500.0);
		spread(&mut state);
		let before = state.view.transform.clone();
		let (x, y) = state.sim_nodes[2].position();
		let (sx, sy) = to_screen(&state, x, y);

		state.pointer_down(sx, sy);
		assert!(state.simulation.is_running());
		state.pointer_move(sx + 40.0, sy + 20.0);
		let k = state.view.transform.k;
		assert_eq!(state.sim_nodes[2].fx, Some(x + 40.0 / k));
		assert_eq!(state.sim_nodes[2].fy, Some(y + 20.0 / k));
		assert_eq!(state.cursor(), "grabbing");

		assert!(!state.pointer_up());
		assert!(state.selected().is_none());
		assert!(!state.sim_nodes[2].is_pinned());
		assert_eq!(state.view.transform, before);
	}

	#[test]
	fn dragging_background_pans_without_clearing_selection() {
		let mut state = ForceGraphState::new(&scenario(), "0xMAIN", 600.0, 500.0);
		spread(&mut state);
		click_node(&mut state, 1);
		let before = state.view.transform.clone();

		let (sx, sy) = to_screen(&state, 500.0, 5000.0);
		state.pointer_down(sx, sy);
		state.pointer_move(sx + 30.0, sy - 10.0);
		state.pointer_up();

		assert_eq!(state.view.transform.x, before.x + 30.0);
		assert_eq!(state.view.transform.y, before.y - 10.0);
		assert_eq!(state.view.selected, Some(1));
	}

	#[test]
	fn zoom_is_clamped_and_anchored() {
		let mut state = ForceGraphState::new(&scenario(), "0xMAIN", 600.0, 500.0);
		let anchor = state.screen_to_graph(100.0, 80.0);
		state.zoom_at(100.0, 80.0, 1.1);
		let after = state.screen_to_graph(100.0, 80.0);
		assert!((anchor.0 - after.0).abs() < 1e-9 && (anchor.1 - after.1).abs() < 1e-9);

		for _ in 0..100 {
			state.zoom_at(0.0, 0.0, 1.1);
		}
		assert_eq!(state.view.transform.k, MAX_ZOOM);
		for _ in 0..100 {
			state.zoom_at(0.0, 0.0, 0.9);
		}
		assert_eq!(state.view.transform.k, MIN_ZOOM);
	}

	#[test]
	fn stopped_state_freezes_positions() {
		let mut state = ForceGraphState::new(&scenario(), "0xMAIN", 600.0, 500.0);
		state.stop();
		let frozen = state.sim_nodes.clone();
		for _ in 0..10 {
			state.tick();
		}
		assert_eq!(state.sim_nodes, frozen);
	}

	#[test]
	fn settled_frames_skip_redraw_until_view_changes() {
		let mut state = ForceGraphState::new(&scenario(), "0xMAIN", 600.0, 500.0);
		spread(&mut state);
		assert!(state.tick());
		state.stop();
		assert!(!state.tick());

		state.zoom_at(100.0, 80.0, 1.1);
		assert!(state.tick());
		assert!(!state.tick());

		let (sx, sy) = to_screen(&state, 1000.0, 0.0);
		state.pointer_move(sx, sy);
		assert!(state.tick());
		state.pointer_move(sx + 1.0, sy);
		assert!(!state.tick());

		state.release_focal();
		assert!(state.tick());
		state.release_focal();
		assert!(!state.tick());
	}

	#[test]
	fn hover_drives_cursor() {
		let mut state = ForceGraphState::new(&scenario(), "0xMAIN", 600.0, 500.0);
		spread(&mut state);
		let (sx, sy) = to_screen(&state, 1000.0, 0.0);
		state.pointer_move(sx, sy);
		assert_eq!(state.hovered, Some(1));
		assert_eq!(state.cursor(), "pointer");
		state.pointer_leave();
		assert_eq!(state.cursor(), "grab");
	}
}
