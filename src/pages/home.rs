use leptos::prelude::*;

use crate::components::force_graph::RiskAssessment;
use crate::components::fund_flow::FundFlowCard;

/// Fund-flow slice of a flagged address's risk response.
const FLAGGED_SAMPLE: &str = r#"{
	"address": "0x8589427373D6D84E98730D7795D8f6f8731FDA16",
	"accounts": {
		"0x16D86Bc643feD8336621092975201194C09CCa36": {
			"type": "eoa",
			"label": "0x16D86Bc643feD8336621092975201194C09CCa36",
			"address": "0x16D86Bc643feD8336621092975201194C09CCa36",
			"risk_score": 150,
			"additional_labels": { "ofac": true, "hacker": false, "mixers": false, "drainer": true, "fbi_ic3": false, "tornado": true }
		},
		"0x40f41c762763436d73DE1bafb11729C36Ad32a54": {
			"type": "eoa",
			"label": "0x40f41c762763436d73DE1bafb11729C36Ad32a54",
			"address": "0x40f41c762763436d73DE1bafb11729C36Ad32a54",
			"risk_score": 0,
			"additional_labels": { "ofac": false, "hacker": false, "mixers": false, "drainer": false, "fbi_ic3": false, "tornado": false }
		},
		"0x8589427373D6D84E98730D7795D8f6f8731FDA16": {
			"type": "eoa",
			"label": "Tornado.Cash",
			"address": "0x8589427373D6D84E98730D7795D8f6f8731FDA16",
			"risk_score": 20,
			"additional_labels": { "ofac": true, "hacker": false, "mixers": false, "drainer": false, "fbi_ic3": false, "tornado": false }
		},
		"0x94A1B5CdB22c43faab4AbEb5c74999895464Ddaf": {
			"type": "contract",
			"label": "Tornado.Cash",
			"address": "0x94A1B5CdB22c43faab4AbEb5c74999895464Ddaf",
			"risk_score": 20,
			"additional_labels": { "ofac": true, "hacker": false, "mixers": false, "drainer": false, "fbi_ic3": false, "tornado": false }
		},
		"0xA43Ce8Cc89Eff3AA5593c742fC56A30Ef2427CB0": {
			"type": "eoa",
			"label": "0xA43Ce8Cc89Eff3AA5593c742fC56A30Ef2427CB0",
			"address": "0xA43Ce8Cc89Eff3AA5593c742fC56A30Ef2427CB0",
			"risk_score": 0,
			"additional_labels": { "ofac": false, "hacker": false, "mixers": false, "drainer": false, "fbi_ic3": false, "tornado": false }
		},
		"0xb541fc07bC7619fD4062A54d96268525cBC6FfEF": {
			"type": "contract",
			"label": "Tornado.Cash",
			"address": "0xb541fc07bC7619fD4062A54d96268525cBC6FfEF",
			"risk_score": 20,
			"additional_labels": { "ofac": true, "hacker": false, "mixers": false, "drainer": false, "fbi_ic3": false, "tornado": false }
		}
	}
}"#;

/// A low-risk address with a single clean counterparty.
const CLEAN_SAMPLE: &str = r#"{
	"address": "0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984",
	"accounts": {
		"0x40f41c762763436d73DE1bafb11729C36Ad32a54": {
			"type": "eoa",
			"label": "0x40f41c762763436d73DE1bafb11729C36Ad32a54",
			"address": "0x40f41c762763436d73DE1bafb11729C36Ad32a54",
			"risk_score": 0,
			"additional_labels": { "ofac": false, "hacker": false, "mixers": false, "drainer": false, "fbi_ic3": false, "tornado": false }
		}
	}
}"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sample {
	Flagged,
	Clean,
}

impl Sample {
	fn json(self) -> &'static str {
		match self {
			Sample::Flagged => FLAGGED_SAMPLE,
			Sample::Clean => CLEAN_SAMPLE,
		}
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let (sample, set_sample) = signal(Sample::Flagged);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="page">
				<header class="page-header">
					<h1>"Threat Risks"</h1>
					<p class="subtitle">"Fund flows and counterparties of the searched address."</p>
					<div class="sample-picker">
						<button
							class:active=move || sample.get() == Sample::Flagged
							on:click=move |_| set_sample.set(Sample::Flagged)
						>
							"Flagged address"
						</button>
						<button
							class:active=move || sample.get() == Sample::Clean
							on:click=move |_| set_sample.set(Sample::Clean)
						>
							"Clean address"
						</button>
					</div>
				</header>
				{move || {
					RiskAssessment::from_json(sample.get().json())
						.map(|assessment| {
							view! {
								<p class="searched-address">{assessment.address.clone()}</p>
								<FundFlowCard assessment=assessment />
							}
						})
				}}
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::{BuilderConfig, build_graph};

	#[test]
	fn samples_parse_and_derive() {
		let flagged = RiskAssessment::from_json(FLAGGED_SAMPLE).unwrap();
		let graph = build_graph(&flagged, &BuilderConfig::default());
		assert_eq!(graph.nodes.len(), 6);
		assert_eq!(graph.links.len(), 5);
		assert!(graph.validate().is_ok());

		let clean = RiskAssessment::from_json(Sample::Clean.json()).unwrap();
		let graph = build_graph(&clean, &BuilderConfig::default());
		assert_eq!(graph.links.len(), 1);
		assert!(graph.validate().is_err());
		assert!(graph.with_focal_node(&clean.address).validate().is_ok());
	}
}
