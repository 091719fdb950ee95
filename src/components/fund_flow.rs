use std::time::Duration;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen_futures::JsFuture;
use web_sys::{ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};

use super::force_graph::style::risk_color;
use super::force_graph::{
	BuilderConfig, ForceGraphCanvas, RiskAccount, RiskAssessment, build_graph, flag_display_name,
};

/// How long a copy button reads "Copied!".
const COPIED_RESET: Duration = Duration::from_millis(1200);
/// Delay before scrolling so the graph section exists in the DOM.
const SCROLL_DELAY: Duration = Duration::from_millis(50);

/// Coarse label for how many counterparties an address deals with.
pub fn interaction_frequency(connected: usize) -> &'static str {
	match connected {
		0..=2 => "Low",
		3..=5 => "Medium",
		_ => "High",
	}
}

/// Which row last copied its address.
///
/// Every copy hands out a ticket; only the reset carrying the latest ticket
/// clears the row, so an older timer cannot cut a newer "Copied!" short.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CopiedRow {
	row: Option<usize>,
	ticket: u32,
}

impl CopiedRow {
	pub fn copy(&mut self, row: usize) -> u32 {
		self.ticket = self.ticket.wrapping_add(1);
		self.row = Some(row);
		self.ticket
	}

	pub fn expire(&mut self, ticket: u32) {
		if self.ticket == ticket {
			self.row = None;
		}
	}

	pub fn is_copied(&self, row: usize) -> bool {
		self.row == Some(row)
	}
}

fn copy_address(address: String, row: usize, copied: RwSignal<CopiedRow>) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let clipboard = window.navigator().clipboard();
	wasm_bindgen_futures::spawn_local(async move {
		match JsFuture::from(clipboard.write_text(&address)).await {
			Ok(_) => {
				let Some(ticket) = copied.try_update(|c| c.copy(row)) else {
					return;
				};
				set_timeout(
					move || {
						copied.try_update(|c| c.expire(ticket));
					},
					COPIED_RESET,
				);
			}
			Err(err) => warn!("Could not copy {address} to the clipboard: {err:?}"),
		}
	});
}

fn account_row(
	row: usize,
	address: String,
	account: &RiskAccount,
	copied: RwSignal<CopiedRow>,
) -> impl IntoView + use<> {
	let tags = account
		.flags
		.active()
		.map(|flag| view! { <span class="flag-tag">{flag_display_name(flag).to_string()}</span> })
		.collect_view();
	let is_copied = move || copied.with(|c| c.is_copied(row));
	let to_copy = address.clone();
	view! {
		<tr>
			<td class="address">
				<button
					type="button"
					class="copy-address"
					class:copied=is_copied
					title=move || if is_copied() { "Copied!" } else { "Copy address" }
					on:click=move |_| copy_address(to_copy.clone(), row, copied)
				>
					{move || if is_copied() { "Copied!" } else { "Copy" }}
				</button>
				{address}
			</td>
			<td class="capitalize">{account.kind.caption().to_lowercase()}</td>
			<td class="score" style=format!("color: {}", risk_color(account.risk_score))>
				{account.risk_score.to_string()}
			</td>
			<td class="muted">{account.label.clone()}</td>
			<td class="tags">{tags}</td>
		</tr>
	}
}

/// Related accounts, network statistics and the on-demand relationship graph.
#[component]
pub fn FundFlowCard(assessment: RiskAssessment) -> impl IntoView {
	let connected = assessment.accounts.len();
	let graph = build_graph(&assessment, &BuilderConfig::default());
	let data = Signal::derive(move || graph.clone());
	let focal = assessment.address.clone();
	let (show_graph, set_show_graph) = signal(false);
	let copied = RwSignal::new(CopiedRow::default());
	let graph_ref = NodeRef::<leptos::html::Section>::new();

	let rows = assessment
		.accounts
		.iter()
		.enumerate()
		.map(|(row, (address, account))| account_row(row, address.clone(), account, copied))
		.collect_view();

	let toggle_graph = move |_| {
		set_show_graph.update(|visible| *visible = !*visible);
		if show_graph.get_untracked() {
			set_timeout(
				move || {
					if let Some(section) = graph_ref.get_untracked() {
						let options = ScrollIntoViewOptions::new();
						options.set_behavior(ScrollBehavior::Smooth);
						options.set_block(ScrollLogicalPosition::Center);
						section.scroll_into_view_with_scroll_into_view_options(&options);
					}
				},
				SCROLL_DELAY,
			);
		}
	};

	view! {
		<div class="fund-flow-card">
			<section class="card">
				<h3>"Recent Fund Flows"</h3>
				<table class="fund-flow-table">
					<thead>
						<tr>
							<th>"Address"</th>
							<th>"Type"</th>
							<th>"Risk Score"</th>
							<th>"Labels"</th>
							<th>"Tags"</th>
						</tr>
					</thead>
					<tbody>{rows}</tbody>
				</table>
			</section>

			<section class="card">
				<div class="card-header">
					<h3>"Network Statistics"</h3>
					<button class="graph-toggle" on:click=toggle_graph>
						{move || if show_graph.get() { "Hide graph" } else { "Show graph" }}
					</button>
				</div>
				<dl class="stats">
					<dt>"Connected Addresses"</dt>
					<dd>{connected}</dd>
					<dt>"Interaction Frequency"</dt>
					<dd>{interaction_frequency(connected)}</dd>
				</dl>
			</section>

			<Show when=move || show_graph.get()>
				<section class="card" node_ref=graph_ref>
					<h3>"Blockchain Address Connections"</h3>
					<ForceGraphCanvas data=data focal=focal.clone() height=Some(500.0) />
				</section>
			</Show>
		</div>
	}
}
