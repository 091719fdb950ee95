use leptos::prelude::*;

use super::style::{self, display_label};
use super::types::{GraphNode, flag_display_name};

/// What the detail panel shows for the selected node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetail {
	pub title: String,
	pub address: String,
	pub kind: &'static str,
	pub risk_score: f64,
	pub risk_color: &'static str,
	pub flags: Vec<String>,
}

impl From<&GraphNode> for NodeDetail {
	fn from(node: &GraphNode) -> Self {
		Self {
			title: display_label(node),
			address: node.id.clone(),
			kind: node.kind.caption(),
			risk_score: node.risk_score,
			risk_color: style::risk_color(node.risk_score),
			flags: node.flags.active().map(|f| flag_display_name(f).to_string()).collect(),
		}
	}
}

#[component]
pub fn NodeDetailPanel(selected: RwSignal<Option<NodeDetail>>) -> impl IntoView {
	move || {
		selected.get().map(|detail| {
			let flags = (!detail.flags.is_empty()).then(|| {
				view! {
					<div class="detail-flags">
						<p>"Flags:"</p>
						<div class="flag-list">
							{detail
								.flags
								.iter()
								.map(|flag| view! { <span class="flag-tag">{flag.clone()}</span> })
								.collect_view()}
						</div>
					</div>
				}
			});
			view! {
				<div class="node-detail" on:click=|ev| ev.stop_propagation()>
					<h3>{detail.title.clone()}</h3>
					<p class="detail-address">{detail.address.clone()}</p>
					<div class="detail-row">
						<span>"Type: "<strong>{detail.kind}</strong></span>
						<span>
							"Risk: "
							<strong style=format!("color: {}", detail.risk_color)>
								{detail.risk_score.to_string()}
							</strong>
						</span>
					</div>
					{flags}
					<button
						class="detail-close"
						on:click=move |ev| {
							ev.stop_propagation();
							selected.set(None);
						}
					>
						"Close"
					</button>
				</div>
			}
		})
	}
}

#[component]
pub fn GraphLegend() -> impl IntoView {
	view! {
		<div class="graph-legend">
			<span class="legend-item">
				<span class="swatch" style=format!("background: {}", style::HIGH_COLOR)></span>
				"High Risk (100+)"
			</span>
			<span class="legend-item">
				<span class="swatch" style=format!("background: {}", style::MEDIUM_COLOR)></span>
				"Medium Risk (10-99)"
			</span>
			<span class="legend-item">
				<span class="swatch" style=format!("background: {}", style::LOW_COLOR)></span>
				"Low Risk (0-9)"
			</span>
			<span class="legend-item">
				<span class="swatch swatch-flagged"></span>
				"Flagged Accounts"
			</span>
			<span class="legend-item">
				<span class="swatch swatch-contract"></span>
				"Contract"
			</span>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::AccountType;

	#[test]
	fn detail_lists_only_true_flags() {
		let node = GraphNode {
			id: "0x16D86Bc643feD8336621092975201194C09CCa36".into(),
			label: "0x16D86Bc643feD8336621092975201194C09CCa36".into(),
			kind: AccountType::Eoa,
			risk_score: 150.0,
			flags: [("ofac", true), ("hacker", false), ("fbi_ic3", true)]
				.into_iter()
				.collect(),
		};
		let detail = NodeDetail::from(&node);
		assert_eq!(detail.title, "0x16D8...Ca36");
		assert_eq!(detail.address, node.id);
		assert_eq!(detail.kind, "EOA");
		assert_eq!(detail.risk_color, style::HIGH_COLOR);
		assert_eq!(detail.flags, vec!["FBI IC3", "OFAC"]);
	}
}
