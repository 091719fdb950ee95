use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="page">
			<h1>"Page not found"</h1>
			<p class="subtitle">"The page you were looking for does not exist."</p>
			<a href="/">"Back to fund flows"</a>
		</div>
	}
}
