use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
	#[error("link {from} -> {to} references a missing node")]
	DanglingLink { from: String, to: String },
	#[error("duplicate node id {0}")]
	DuplicateNode(String),
	#[error("invalid risk assessment: {0}")]
	InvalidAssessment(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
	#[default]
	Eoa,
	Contract,
}

impl AccountType {
	pub fn caption(self) -> &'static str {
		match self {
			AccountType::Eoa => "EOA",
			AccountType::Contract => "CONTRACT",
		}
	}
}

/// Named boolean risk indicators, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RiskFlags(BTreeMap<String, bool>);

impl RiskFlags {
	pub fn any(&self) -> bool {
		self.0.values().any(|&v| v)
	}

	pub fn active(&self) -> impl Iterator<Item = &str> {
		self.0.iter().filter(|(_, v)| **v).map(|(k, _)| k.as_str())
	}
}

impl<K: Into<String>> FromIterator<(K, bool)> for RiskFlags {
	fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}
}

/// Display name used for a flag in tags and the detail panel.
pub fn flag_display_name(key: &str) -> &str {
	match key {
		"ofac" => "OFAC",
		"hacker" => "HACKER",
		"mixers" => "MIXERS",
		"drainer" => "DRAINER",
		"fbi_ic3" => "FBI IC3",
		"tornado" => "Tornado",
		other => other,
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RiskAccount {
	pub address: String,
	pub label: String,
	#[serde(rename = "type", default)]
	pub kind: AccountType,
	#[serde(default)]
	pub risk_score: f64,
	#[serde(rename = "additional_labels", default)]
	pub flags: RiskFlags,
}

/// The slice of a risk-assessment response the graph needs.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RiskAssessment {
	pub address: String,
	#[serde(default)]
	pub accounts: BTreeMap<String, RiskAccount>,
}

impl RiskAssessment {
	pub fn from_json(json: &str) -> Result<Self, GraphError> {
		Ok(serde_json::from_str(json)?)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub label: String,
	pub kind: AccountType,
	pub risk_score: f64,
	pub flags: RiskFlags,
}

impl GraphNode {
	pub fn from_account(id: &str, account: &RiskAccount) -> Self {
		Self {
			id: id.to_string(),
			label: account.label.clone(),
			kind: account.kind,
			risk_score: account.risk_score,
			flags: account.flags.clone(),
		}
	}

	/// Neutral hub node for a focal address that has no account entry.
	pub fn focal(address: &str) -> Self {
		Self {
			id: address.to_string(),
			label: address.to_string(),
			kind: AccountType::Eoa,
			risk_score: 0.0,
			flags: RiskFlags::default(),
		}
	}

	pub fn is_flagged(&self) -> bool {
		self.flags.any()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
	pub weight: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

impl GraphData {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Reports the first duplicate id or dangling link.
	pub fn validate(&self) -> Result<(), GraphError> {
		let mut seen = std::collections::HashSet::new();
		for node in &self.nodes {
			if !seen.insert(node.id.as_str()) {
				return Err(GraphError::DuplicateNode(node.id.clone()));
			}
		}
		for link in &self.links {
			if !seen.contains(link.source.as_str()) || !seen.contains(link.target.as_str()) {
				return Err(GraphError::DanglingLink {
					from: link.source.clone(),
					to: link.target.clone(),
				});
			}
		}
		Ok(())
	}

	/// Copy of the graph with a hub node for `focal` when links start there
	/// but no node carries that id.
	pub fn with_focal_node(&self, focal: &str) -> GraphData {
		let mut data = self.clone();
		let needs_hub = !data.nodes.is_empty()
			&& data.node(focal).is_none()
			&& data.links.iter().any(|l| l.source == focal);
		if needs_hub {
			data.nodes.insert(0, GraphNode::focal(focal));
		}
		data
	}
}
