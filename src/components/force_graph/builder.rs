use log::info;

use super::types::{GraphData, GraphLink, GraphNode, RiskAssessment};

#[derive(Clone, Debug)]
pub struct BuilderConfig {
	pub link_weight: f64,
}

impl Default for BuilderConfig {
	fn default() -> Self {
		Self { link_weight: 1.0 }
	}
}

/// Derive the fund-flow star graph: one node per related account and one link
/// from the focal address to each of them. An account keyed by the focal
/// address keeps its node but gets no self-link.
pub fn build_graph(assessment: &RiskAssessment, config: &BuilderConfig) -> GraphData {
	let focal = assessment.address.as_str();
	let nodes: Vec<GraphNode> = assessment
		.accounts
		.iter()
		.map(|(id, account)| GraphNode::from_account(id, account))
		.collect();

	let links: Vec<GraphLink> = assessment
		.accounts
		.keys()
		.filter(|id| id.as_str() != focal)
		.map(|id| GraphLink {
			source: focal.to_string(),
			target: id.clone(),
			weight: config.link_weight,
		})
		.collect();

	info!(
		"Derived fund-flow graph for {}: {} nodes, {} links",
		focal,
		nodes.len(),
		links.len()
	);
	GraphData { nodes, links }
}
