//! Force-directed layout over an explicit node/link arena.
//!
//! One `step` applies, in order: link springs, many-body charge, centering,
//! collision and weak axis springs, then integrates velocities. Energy
//! (`alpha`) decays geometrically toward `alpha_target`; once both are under
//! `alpha_min` the simulation is settled and `step` is a no-op.

use std::f64::consts::PI;

#[derive(Clone, Debug)]
pub struct ForceConfig {
	pub charge: f64,
	pub link_base_distance: f64,
	pub link_risk_divisor: f64,
	pub collide_padding: f64,
	pub axis_strength: f64,
	pub velocity_decay: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub drag_alpha_target: f64,
}

impl Default for ForceConfig {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			charge: -400.0,
			link_base_distance: 120.0,
			link_risk_divisor: 20.0,
			collide_padding: 15.0,
			axis_strength: 0.07,
			velocity_decay: 0.4,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			drag_alpha_target: 0.3,
		}
	}
}

impl ForceConfig {
	/// Rest length of a link: riskier endpoints pull tighter.
	pub fn link_distance(&self, source_risk: f64, target_risk: f64) -> f64 {
		let risk = source_risk.max(target_risk).max(0.0);
		self.link_base_distance / (risk / self.link_risk_divisor + 1.0)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	pub radius: f64,
}

impl SimNode {
	/// Unplaced node; the simulation seeds its position.
	pub fn new(radius: f64) -> Self {
		Self {
			x: f64::NAN,
			y: f64::NAN,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
			radius,
		}
	}

	pub fn pin(&mut self, x: f64, y: f64) {
		self.fx = Some(x);
		self.fy = Some(y);
	}

	pub fn unpin(&mut self) {
		self.fx = None;
		self.fy = None;
	}

	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}

	/// Drawable position; unset or diverged coordinates read as the origin.
	pub fn position(&self) -> (f64, f64) {
		if self.x.is_finite() && self.y.is_finite() {
			(self.x, self.y)
		} else {
			(0.0, 0.0)
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimLink {
	pub source: usize,
	pub target: usize,
	pub distance: f64,
}

/// d3's linear congruential source, used only to break exact overlaps.
#[derive(Clone, Debug)]
struct Lcg(u64);

impl Lcg {
	fn next(&mut self) -> f64 {
		self.0 = (1_664_525 * self.0 + 1_013_904_223) % 4_294_967_296;
		self.0 as f64 / 4_294_967_296.0
	}

	fn jiggle(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

pub struct Simulation {
	config: ForceConfig,
	alpha: f64,
	alpha_target: f64,
	stopped: bool,
	strengths: Vec<f64>,
	biases: Vec<f64>,
	rng: Lcg,
}

impl Simulation {
	pub fn new(config: ForceConfig, nodes: &mut [SimNode], links: &[SimLink]) -> Self {
		seed_positions(nodes);

		let mut degree = vec![0usize; nodes.len()];
		for link in links {
			degree[link.source] += 1;
			degree[link.target] += 1;
		}
		let strengths = links
			.iter()
			.map(|l| 1.0 / degree[l.source].min(degree[l.target]).max(1) as f64)
			.collect();
		let biases = links
			.iter()
			.map(|l| {
				let (s, t) = (degree[l.source] as f64, degree[l.target] as f64);
				s / (s + t)
			})
			.collect();

		Self {
			config,
			alpha: 1.0,
			alpha_target: 0.0,
			stopped: false,
			strengths,
			biases,
			rng: Lcg(1),
		}
	}

	pub fn config(&self) -> &ForceConfig {
		&self.config
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	pub fn is_settled(&self) -> bool {
		self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
	}

	pub fn is_running(&self) -> bool {
		!self.stopped && !self.is_settled()
	}

	/// Resume ticking; energy climbs back toward `alpha_target`.
	pub fn restart(&mut self) {
		self.stopped = false;
	}

	pub fn stop(&mut self) {
		self.stopped = true;
	}

	/// Run `steps` integration steps back to back, ignoring settle state.
	pub fn warm_up(&mut self, nodes: &mut [SimNode], links: &[SimLink], steps: usize) -> usize {
		(0..steps).map(|_| self.advance(nodes, links)).sum()
	}

	/// Advance one frame. Returns how many diverged nodes had to be reset.
	pub fn step(&mut self, nodes: &mut [SimNode], links: &[SimLink]) -> usize {
		if !self.is_running() {
			return 0;
		}
		self.advance(nodes, links)
	}

	fn advance(&mut self, nodes: &mut [SimNode], links: &[SimLink]) -> usize {
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

		self.apply_links(nodes, links);
		self.apply_charge(nodes);
		apply_center(nodes);
		self.apply_collision(nodes);
		self.apply_axes(nodes);

		let keep = 1.0 - self.config.velocity_decay;
		for node in nodes.iter_mut() {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= keep;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= keep;
					node.y += node.vy;
				}
			}
		}

		reset_diverged(nodes)
	}

	fn apply_links(&mut self, nodes: &mut [SimNode], links: &[SimLink]) {
		for (i, link) in links.iter().enumerate() {
			let (s, t) = (link.source, link.target);
			let mut dx = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
			let mut dy = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
			if dx == 0.0 {
				dx = self.rng.jiggle();
			}
			if dy == 0.0 {
				dy = self.rng.jiggle();
			}
			let len = (dx * dx + dy * dy).sqrt();
			let f = (len - link.distance) / len * self.alpha * self.strengths[i];
			let (dx, dy, b) = (dx * f, dy * f, self.biases[i]);
			nodes[t].vx -= dx * b;
			nodes[t].vy -= dy * b;
			nodes[s].vx += dx * (1.0 - b);
			nodes[s].vy += dy * (1.0 - b);
		}
	}

	fn apply_charge(&mut self, nodes: &mut [SimNode]) {
		let k = self.config.charge * self.alpha;
		for i in 0..nodes.len() {
			let (mut ax, mut ay) = (0.0, 0.0);
			for j in 0..nodes.len() {
				if i == j {
					continue;
				}
				let mut dx = nodes[j].x - nodes[i].x;
				let mut dy = nodes[j].y - nodes[i].y;
				let mut l = dx * dx + dy * dy;
				if dx == 0.0 {
					dx = self.rng.jiggle();
					l += dx * dx;
				}
				if dy == 0.0 {
					dy = self.rng.jiggle();
					l += dy * dy;
				}
				if l < 1.0 {
					l = l.sqrt();
				}
				ax += dx * k / l;
				ay += dy * k / l;
			}
			nodes[i].vx += ax;
			nodes[i].vy += ay;
		}
	}

	fn apply_collision(&mut self, nodes: &mut [SimNode]) {
		let pad = self.config.collide_padding;
		for i in 0..nodes.len() {
			let ri = nodes[i].radius + pad;
			let (xi, yi) = (nodes[i].x + nodes[i].vx, nodes[i].y + nodes[i].vy);
			for j in (i + 1)..nodes.len() {
				let rj = nodes[j].radius + pad;
				let r = ri + rj;
				let mut dx = xi - nodes[j].x - nodes[j].vx;
				let mut dy = yi - nodes[j].y - nodes[j].vy;
				let mut l = dx * dx + dy * dy;
				if l >= r * r {
					continue;
				}
				if dx == 0.0 {
					dx = self.rng.jiggle();
					l += dx * dx;
				}
				if dy == 0.0 {
					dy = self.rng.jiggle();
					l += dy * dy;
				}
				let len = l.sqrt();
				let f = (r - len) / len;
				let (dx, dy) = (dx * f, dy * f);
				let share = rj * rj / (ri * ri + rj * rj);
				nodes[i].vx += dx * share;
				nodes[i].vy += dy * share;
				nodes[j].vx -= dx * (1.0 - share);
				nodes[j].vy -= dy * (1.0 - share);
			}
		}
	}

	fn apply_axes(&self, nodes: &mut [SimNode]) {
		let k = self.config.axis_strength * self.alpha;
		for node in nodes.iter_mut() {
			node.vx -= node.x * k;
			node.vy -= node.y * k;
		}
	}
}

/// Phyllotaxis seeding around the origin for nodes without a position.
fn seed_positions(nodes: &mut [SimNode]) {
	let angle = PI * (3.0 - 5f64.sqrt());
	for (i, node) in nodes.iter_mut().enumerate() {
		if node.x.is_finite() && node.y.is_finite() {
			continue;
		}
		let radius = 10.0 * (0.5 + i as f64).sqrt();
		let theta = i as f64 * angle;
		node.x = radius * theta.cos();
		node.y = radius * theta.sin();
		node.vx = 0.0;
		node.vy = 0.0;
	}
}

fn apply_center(nodes: &mut [SimNode]) {
	if nodes.is_empty() {
		return;
	}
	let n = nodes.len() as f64;
	let (sx, sy) = nodes
		.iter()
		.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
	let (mx, my) = (sx / n, sy / n);
	for node in nodes.iter_mut() {
		node.x -= mx;
		node.y -= my;
	}
}

fn reset_diverged(nodes: &mut [SimNode]) -> usize {
	let mut reset = 0;
	for node in nodes.iter_mut() {
		let finite = node.x.is_finite() && node.y.is_finite();
		if finite && node.vx.is_finite() && node.vy.is_finite() {
			continue;
		}
		if !finite {
			node.x = 0.0;
			node.y = 0.0;
			reset += 1;
		}
		node.vx = 0.0;
		node.vy = 0.0;
	}
	reset
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pair(distance: f64) -> (Vec<SimNode>, Vec<SimLink>) {
		(
			vec![SimNode::new(1.0), SimNode::new(1.0)],
			vec![SimLink {
				source: 0,
				target: 1,
				distance,
			}],
		)
	}

	fn springs_only() -> ForceConfig {
		ForceConfig {
			charge: 0.0,
			collide_padding: 0.0,
			axis_strength: 0.0,
			..ForceConfig::default()
		}
	}

	fn gap(nodes: &[SimNode]) -> f64 {
		let (dx, dy) = (nodes[1].x - nodes[0].x, nodes[1].y - nodes[0].y);
		(dx * dx + dy * dy).sqrt()
	}

	#[test]
	fn seeds_distinct_finite_positions() {
		let mut nodes = vec![SimNode::new(5.0); 12];
		Simulation::new(ForceConfig::default(), &mut nodes, &[]);
		for (i, a) in nodes.iter().enumerate() {
			assert!(a.x.is_finite() && a.y.is_finite());
			for b in &nodes[i + 1..] {
				assert!(a.x != b.x || a.y != b.y);
			}
		}
	}

	#[test]
	fn link_distance_shrinks_with_risk() {
		let config = ForceConfig::default();
		assert_eq!(config.link_distance(0.0, 0.0), 120.0);
		assert_eq!(config.link_distance(0.0, 20.0), 60.0);
		assert!(config.link_distance(150.0, 0.0) < config.link_distance(5.0, 0.0));
		assert_eq!(config.link_distance(150.0, 0.0), config.link_distance(0.0, 150.0));
	}

	#[test]
	fn spring_converges_to_rest_length() {
		let (mut nodes, links) = pair(60.0);
		let mut sim = Simulation::new(springs_only(), &mut nodes, &links);
		sim.warm_up(&mut nodes, &links, 300);
		assert!((gap(&nodes) - 60.0).abs() < 5.0, "gap {}", gap(&nodes));
	}

	#[test]
	fn charge_pushes_nodes_apart() {
		let mut nodes = vec![SimNode::new(1.0), SimNode::new(1.0)];
		let config = ForceConfig {
			collide_padding: 0.0,
			axis_strength: 0.0,
			..ForceConfig::default()
		};
		let mut sim = Simulation::new(config, &mut nodes, &[]);
		let before = gap(&nodes);
		sim.warm_up(&mut nodes, &[], 20);
		assert!(gap(&nodes) > before);
	}

	#[test]
	fn collision_separates_overlapping_nodes() {
		let mut nodes = vec![SimNode::new(20.0), SimNode::new(20.0)];
		let config = ForceConfig {
			charge: 0.0,
			axis_strength: 0.0,
			collide_padding: 0.0,
			..ForceConfig::default()
		};
		let mut sim = Simulation::new(config, &mut nodes, &[]);
		sim.warm_up(&mut nodes, &[], 100);
		assert!(gap(&nodes) >= 39.0, "gap {}", gap(&nodes));
	}

	#[test]
	fn centering_keeps_mean_at_origin() {
		let mut nodes = vec![SimNode::new(3.0); 6];
		let links: Vec<SimLink> = (1..6)
			.map(|t| SimLink {
				source: 0,
				target: t,
				distance: 80.0,
			})
			.collect();
		let mut sim = Simulation::new(ForceConfig::default(), &mut nodes, &links);
		sim.warm_up(&mut nodes, &links, 50);
		let mean_x = nodes.iter().map(|n| n.x).sum::<f64>() / 6.0;
		let mean_y = nodes.iter().map(|n| n.y).sum::<f64>() / 6.0;
		assert!(mean_x.abs() < 50.0 && mean_y.abs() < 50.0);
	}

	#[test]
	fn pinned_node_holds_position() {
		let (mut nodes, links) = pair(60.0);
		nodes[0].pin(0.0, 0.0);
		let mut sim = Simulation::new(ForceConfig::default(), &mut nodes, &links);
		sim.warm_up(&mut nodes, &links, 30);
		assert_eq!((nodes[0].x, nodes[0].y), (0.0, 0.0));
		assert_eq!((nodes[0].vx, nodes[0].vy), (0.0, 0.0));

		nodes[0].unpin();
		sim.warm_up(&mut nodes, &links, 1);
		assert!(!nodes[0].is_pinned());
	}

	#[test]
	fn energy_decays_until_settled() {
		let (mut nodes, links) = pair(60.0);
		let mut sim = Simulation::new(ForceConfig::default(), &mut nodes, &links);
		let mut steps = 0;
		while sim.is_running() && steps < 1000 {
			sim.step(&mut nodes, &links);
			steps += 1;
		}
		assert!(sim.is_settled());
		assert!((250..=350).contains(&steps), "settled after {steps}");

		let frozen = nodes.clone();
		sim.step(&mut nodes, &links);
		assert_eq!(nodes, frozen);
	}

	#[test]
	fn alpha_target_reheats() {
		let (mut nodes, links) = pair(60.0);
		let mut sim = Simulation::new(ForceConfig::default(), &mut nodes, &links);
		sim.warm_up(&mut nodes, &links, 400);
		assert!(sim.is_settled());

		sim.set_alpha_target(sim.config().drag_alpha_target);
		sim.restart();
		assert!(sim.is_running());
		for _ in 0..200 {
			sim.step(&mut nodes, &links);
		}
		assert!(sim.alpha() > 0.2);
	}

	#[test]
	fn stopped_simulation_does_not_mutate() {
		let (mut nodes, links) = pair(60.0);
		let mut sim = Simulation::new(ForceConfig::default(), &mut nodes, &links);
		sim.stop();
		let frozen = nodes.clone();
		assert_eq!(sim.step(&mut nodes, &links), 0);
		assert_eq!(nodes, frozen);
	}

	#[test]
	fn diverged_positions_fall_back_to_center() {
		let (mut nodes, links) = pair(60.0);
		let mut sim = Simulation::new(ForceConfig::default(), &mut nodes, &links);
		nodes[1].x = f64::INFINITY;
		nodes[1].vy = f64::NAN;
		assert!(sim.step(&mut nodes, &links) >= 1);
		assert!(nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
		assert!(nodes.iter().all(|n| n.vx.is_finite() && n.vy.is_finite()));
		assert_eq!(SimNode::new(1.0).position(), (0.0, 0.0));
	}

	#[test]
	fn deterministic_layout() {
		let run = || {
			let mut nodes = vec![SimNode::new(4.0); 5];
			let links: Vec<SimLink> = (1..5)
				.map(|t| SimLink {
					source: 0,
					target: t,
					distance: 50.0,
				})
				.collect();
			let mut sim = Simulation::new(ForceConfig::default(), &mut nodes, &links);
			sim.warm_up(&mut nodes, &links, 60);
			nodes
		};
		assert_eq!(run(), run());
	}
}
