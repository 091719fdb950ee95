//! Risk-driven visual encoding shared by nodes, links, labels and the detail panel.

use super::types::{AccountType, GraphNode};

pub const HIGH_RISK: f64 = 100.0;
pub const MEDIUM_RISK: f64 = 10.0;

pub const BASE_RADIUS: f64 = 25.0;
const MAX_RISK_FACTOR: f64 = 10.0;
const CONTRACT_FACTOR: f64 = 1.2;
const FLAG_FACTOR: f64 = 1.3;
pub const HALO_PADDING: f64 = 5.0;
pub const CONTRACT_RING_RATIO: f64 = 0.6;

pub const HIGH_COLOR: &str = "#ff3333";
pub const MEDIUM_COLOR: &str = "#ff9933";
pub const LOW_COLOR: &str = "#33cc33";
const LOW_LINK_COLOR: &str = "#999";
const LOW_LABEL_COLOR: &str = "#333";

pub const FLAGGED_STROKE: &str = "#000";
pub const NEUTRAL_STROKE: &str = "#fff";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskTier {
	High,
	Medium,
	Low,
}

impl RiskTier {
	pub fn of(score: f64) -> Self {
		if score >= HIGH_RISK {
			RiskTier::High
		} else if score >= MEDIUM_RISK {
			RiskTier::Medium
		} else {
			RiskTier::Low
		}
	}

	pub fn color(self) -> &'static str {
		match self {
			RiskTier::High => HIGH_COLOR,
			RiskTier::Medium => MEDIUM_COLOR,
			RiskTier::Low => LOW_COLOR,
		}
	}

	pub fn label_color(self) -> &'static str {
		match self {
			RiskTier::Low => LOW_LABEL_COLOR,
			tier => tier.color(),
		}
	}

	pub fn halo_color(self) -> Option<&'static str> {
		match self {
			RiskTier::High => Some("rgba(255, 51, 51, 0.3)"),
			RiskTier::Medium => Some("rgba(255, 153, 51, 0.3)"),
			RiskTier::Low => None,
		}
	}
}

pub fn risk_color(score: f64) -> &'static str {
	RiskTier::of(score).color()
}

pub fn node_radius(node: &GraphNode) -> f64 {
	let risk_factor = (node.risk_score.max(0.0) / 10.0 + 1.0).min(MAX_RISK_FACTOR);
	let type_factor = match node.kind {
		AccountType::Contract => CONTRACT_FACTOR,
		AccountType::Eoa => 1.0,
	};
	let flag_factor = if node.is_flagged() { FLAG_FACTOR } else { 1.0 };
	BASE_RADIUS * risk_factor * type_factor * flag_factor
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub radius: f64,
	pub fill: &'static str,
	pub stroke: &'static str,
	pub stroke_width: f64,
	pub halo: Option<Halo>,
	pub contract_ring: Option<f64>,
	pub label: String,
	pub label_color: &'static str,
	pub caption: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Halo {
	pub radius: f64,
	pub color: &'static str,
}

impl NodeStyle {
	pub fn of(node: &GraphNode) -> Self {
		let radius = node_radius(node);
		let tier = RiskTier::of(node.risk_score);
		let flagged = node.is_flagged();
		Self {
			radius,
			fill: tier.color(),
			stroke: if flagged { FLAGGED_STROKE } else { NEUTRAL_STROKE },
			stroke_width: if flagged { 2.0 } else { 1.0 },
			halo: tier.halo_color().map(|color| Halo {
				radius: radius + HALO_PADDING,
				color,
			}),
			contract_ring: (node.kind == AccountType::Contract)
				.then_some(radius * CONTRACT_RING_RATIO),
			label: display_label(node),
			label_color: tier.label_color(),
			caption: node.kind.caption(),
		}
	}
}

/// Stroke for a link, keyed on the riskier endpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinkStroke {
	/// Medium-to-high gradient running from source to target.
	Gradient(&'static str, &'static str),
	Solid(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkStyle {
	pub stroke: LinkStroke,
	pub width: f64,
	pub opacity: f64,
}

impl LinkStyle {
	pub fn of(source_score: f64, target_score: f64, weight: f64) -> Self {
		let stroke = match RiskTier::of(source_score.max(target_score)) {
			RiskTier::High => LinkStroke::Gradient(MEDIUM_COLOR, HIGH_COLOR),
			RiskTier::Medium => LinkStroke::Solid(MEDIUM_COLOR),
			RiskTier::Low => LinkStroke::Solid(LOW_LINK_COLOR),
		};
		Self {
			stroke,
			width: weight.max(0.0).sqrt() * 3.0,
			opacity: 0.8,
		}
	}
}

/// `0x1234...abcd` style shortening; short ids pass through.
pub fn truncate_address(address: &str) -> String {
	const PREFIX: usize = 6;
	const SUFFIX: usize = 4;
	let chars: Vec<char> = address.chars().collect();
	if chars.len() <= PREFIX + SUFFIX {
		return address.to_string();
	}
	let head: String = chars[..PREFIX].iter().collect();
	let tail: String = chars[chars.len() - SUFFIX..].iter().collect();
	format!("{head}...{tail}")
}

pub fn display_label(node: &GraphNode) -> String {
	if node.label.is_empty() || node.label == node.id {
		truncate_address(&node.id)
	} else {
		node.label.clone()
	}
}
