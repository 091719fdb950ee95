use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window,
};

use super::detail::{GraphLegend, NodeDetail, NodeDetailPanel};
use super::render;
use super::session::GraphSession;
use super::state::{FOCAL_LOCK_MS, ForceGraphState};
use super::types::GraphData;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	/// Address the links fan out from; anchored at the center while the layout settles.
	#[prop(into)]
	focal: Signal<String>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let session = GraphSession::default();
	let selected = RwSignal::new(None::<NodeDetail>);
	let cursor = RwSignal::new("grab");
	let is_empty = Signal::derive(move || data.with(GraphData::is_empty));

	let teardown = SendWrapper::new(session.clone());
	on_cleanup(move || {
		teardown.unmount();
	});

	let session_init = session.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (data, focal) = (data.get(), focal.get());
		session_init.unmount();
		selected.set(None);

		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("No window; fund-flow graph not mounted");
			return;
		};
		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(600.0)
				}),
				height.unwrap_or(500.0),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		if data.is_empty() {
			debug!("No fund flows for {focal}; graph idle");
			return;
		}

		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok(),
			_ => None,
		};
		let Some(ctx) = ctx else {
			error!("Canvas 2d context unavailable");
			return;
		};

		session_init.mount(ForceGraphState::new(&data, &focal, w, h));
		start_animation(&session_init, &window, ctx);
		schedule_focal_release(&session_init, &window);
		if fullscreen {
			listen_for_resize(&session_init, &window, &canvas);
		}
	});

	let session_close = session.clone();
	Effect::new(move |_| {
		if selected.with(Option::is_none) {
			session_close.with(ForceGraphState::clear_selection);
		}
	});

	let sync_selection = {
		let session = session.clone();
		move || {
			let detail = session.with(|s| s.selected().map(NodeDetail::from)).flatten();
			selected.set(detail);
		}
	};
	let sync_cursor = {
		let session = session.clone();
		move || {
			if let Some(c) = session.with(|s| s.cursor()) {
				if cursor.get_untracked() != c {
					cursor.set(c);
				}
			}
		}
	};

	let (session_md, cursor_md) = (session.clone(), sync_cursor.clone());
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) {
			session_md.with(|s| s.pointer_down(x, y));
			cursor_md();
		}
	};

	let (session_mm, cursor_mm) = (session.clone(), sync_cursor.clone());
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) {
			session_mm.with(|s| s.pointer_move(x, y));
			cursor_mm();
		}
	};

	let (session_mu, cursor_mu, selection_mu) =
		(session.clone(), sync_cursor.clone(), sync_selection.clone());
	let on_mouseup = move |_: MouseEvent| {
		if session_mu.with(|s| s.pointer_up()).unwrap_or(false) {
			selection_mu();
		}
		cursor_mu();
	};

	let (session_ml, cursor_ml) = (session.clone(), sync_cursor.clone());
	let on_mouseleave = move |_: MouseEvent| {
		session_ml.with(|s| s.pointer_leave());
		cursor_ml();
	};

	let session_wh = session.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = canvas_point(canvas_ref, ev.client_x(), ev.client_y()) {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			session_wh.with(|s| s.zoom_at(x, y, factor));
		}
	};

	// Distance between two fingers at the previous pinch event.
	let pinch: Rc<Cell<Option<f64>>> = Rc::new(Cell::new(None));

	let (session_ts, pinch_ts) = (session.clone(), pinch.clone());
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let touches = touch_points(canvas_ref, &ev);
		match touches.as_slice() {
			[(x, y)] => {
				session_ts.with(|s| s.pointer_down(*x, *y));
			}
			[a, b, ..] => {
				session_ts.with(|s| s.pointer_leave());
				pinch_ts.set(Some(distance(*a, *b)));
			}
			[] => {}
		}
	};

	let (session_tm, pinch_tm) = (session.clone(), pinch.clone());
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let touches = touch_points(canvas_ref, &ev);
		match touches.as_slice() {
			[(x, y)] => {
				session_tm.with(|s| s.pointer_move(*x, *y));
			}
			[a, b, ..] => {
				let current = distance(*a, *b);
				if let Some(previous) = pinch_tm.get().filter(|d| *d > 0.0) {
					let (cx, cy) = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
					session_tm.with(|s| s.zoom_at(cx, cy, current / previous));
				}
				pinch_tm.set(Some(current));
			}
			[] => {}
		}
	};

	let (session_te, selection_te) = (session.clone(), sync_selection.clone());
	let on_touchend = move |ev: TouchEvent| {
		ev.prevent_default();
		if pinch.take().is_some() {
			return;
		}
		if session_te.with(|s| s.pointer_up()).unwrap_or(false) {
			selection_te();
		}
	};

	view! {
		<div class="force-graph" class:fullscreen=fullscreen>
			<GraphLegend />
			<p class="graph-hint">
				"Drag nodes to reposition • Click a node for details • Scroll to zoom • Drag background to pan"
			</p>
			<div class="graph-stage">
				<canvas
					node_ref=canvas_ref
					class="force-graph-canvas"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:wheel=on_wheel
					on:touchstart=on_touchstart
					on:touchmove=on_touchmove
					on:touchend=on_touchend
					style=move || format!("display: block; cursor: {};", cursor.get())
				/>
				<Show when=move || is_empty.get()>
					<div class="graph-placeholder">"No connected addresses to display"</div>
				</Show>
				<NodeDetailPanel selected=selected />
			</div>
		</div>
	}
}

fn start_animation(session: &GraphSession, window: &Window, ctx: CanvasRenderingContext2d) {
	let frame_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));

	let (session_anim, animate_inner, frame_inner) =
		(session.clone(), animate.clone(), frame_id.clone());
	*animate.borrow_mut() = Some(Closure::new(move || {
		session_anim.with(|s| {
			if s.tick() {
				render::render(s, &ctx);
			}
		});
		if !session_anim.is_mounted() {
			return;
		}
		if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
			frame_inner.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	}));
	if let Some(ref cb) = *animate.borrow() {
		frame_id.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
	}

	let win = window.clone();
	session.on_unmount(move || {
		if let Some(id) = frame_id.take() {
			let _ = win.cancel_animation_frame(id);
		}
		animate.borrow_mut().take();
	});
}

fn schedule_focal_release(session: &GraphSession, window: &Window) {
	if !session.with(|s| s.has_focal_lock()).unwrap_or(false) {
		return;
	}
	let session_release = session.clone();
	let release = Closure::<dyn FnMut()>::new(move || {
		session_release.with(ForceGraphState::release_focal);
	});
	match window.set_timeout_with_callback_and_timeout_and_arguments_0(
		release.as_ref().unchecked_ref(),
		FOCAL_LOCK_MS,
	) {
		Ok(id) => {
			let win = window.clone();
			session.on_unmount(move || {
				win.clear_timeout_with_handle(id);
				drop(release);
			});
		}
		Err(_) => {
			error!("Could not schedule focal release; releasing now");
			session.with(ForceGraphState::release_focal);
		}
	}
}

fn listen_for_resize(session: &GraphSession, window: &Window, canvas: &HtmlCanvasElement) {
	let (session_resize, canvas_resize) = (session.clone(), canvas.clone());
	let resize = Closure::<dyn FnMut()>::new(move || {
		let Some(win) = web_sys::window() else {
			return;
		};
		let (nw, nh) = window_size(&win);
		canvas_resize.set_width(nw as u32);
		canvas_resize.set_height(nh as u32);
		session_resize.with(|s| s.resize(nw, nh));
	});
	if window
		.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())
		.is_ok()
	{
		let win = window.clone();
		session.on_unmount(move || {
			let _ =
				win.remove_event_listener_with_callback("resize", resize.as_ref().unchecked_ref());
		});
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
		window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
	)
}

fn canvas_point(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	client_x: i32,
	client_y: i32,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
}

fn touch_points(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &TouchEvent) -> Vec<(f64, f64)> {
	let touches = ev.touches();
	(0..touches.length())
		.filter_map(|i| touches.get(i))
		.filter_map(|t| canvas_point(canvas_ref, t.client_x(), t.client_y()))
		.collect()
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
	(a.0 - b.0).hypot(a.1 - b.1)
}
