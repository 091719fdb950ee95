use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;
use super::style::LinkStroke;

const BACKGROUND: &str = "#f9fafb";
const SELECTION_COLOR: &str = "#2563eb";
const ARROW_SIZE: f64 = 10.0;
/// Links bow like an SVG arc whose radius is this multiple of the chord.
const ARC_RADIUS_RATIO: f64 = 1.2;

/// Quadratic curve for a link plus the arrowhead placement at its target end.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkCurve {
	pub cx: f64,
	pub cy: f64,
	pub tip_x: f64,
	pub tip_y: f64,
	/// Unit tangent at the tip, pointing into the target.
	pub ux: f64,
	pub uy: f64,
}

impl LinkCurve {
	/// `None` when the endpoints coincide and no direction exists.
	pub fn between(x1: f64, y1: f64, x2: f64, y2: f64, target_radius: f64) -> Option<Self> {
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			return None;
		}
		let r = dist * ARC_RADIUS_RATIO;
		let half = dist / 2.0;
		let sagitta = r - (r * r - half * half).sqrt();
		// A quadratic peaks halfway to its control point.
		let (px, py) = (dy / dist, -dx / dist);
		let (cx, cy) = (
			(x1 + x2) / 2.0 + px * sagitta * 2.0,
			(y1 + y2) / 2.0 + py * sagitta * 2.0,
		);

		let (tx, ty) = (x2 - cx, y2 - cy);
		let tlen = (tx * tx + ty * ty).sqrt();
		let (ux, uy) = (tx / tlen, ty / tlen);
		Some(Self {
			cx,
			cy,
			tip_x: x2 - ux * target_radius,
			tip_y: y2 - uy * target_radius,
			ux,
			uy,
		})
	}
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	if state.is_empty() {
		return;
	}
	let t = &state.view.transform;
	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_links(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	for link in &state.links {
		let (Some(src), Some(tgt)) = (
			state.sim_nodes.get(link.source),
			state.sim_nodes.get(link.target),
		) else {
			continue;
		};
		let ((x1, y1), (x2, y2)) = (src.position(), tgt.position());
		let Some(curve) = LinkCurve::between(x1, y1, x2, y2, tgt.radius) else {
			continue;
		};

		let color = match link.style.stroke {
			LinkStroke::Solid(color) => {
				ctx.set_stroke_style_str(color);
				color
			}
			LinkStroke::Gradient(from, to) => {
				let gradient = ctx.create_linear_gradient(x1, y1, x2, y2);
				let _ = gradient.add_color_stop(0.0, from);
				let _ = gradient.add_color_stop(1.0, to);
				#[allow(deprecated)]
				ctx.set_stroke_style(&gradient);
				to
			}
		};
		ctx.set_global_alpha(link.style.opacity);
		ctx.set_line_width(link.style.width);
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.quadratic_curve_to(curve.cx, curve.cy, curve.tip_x, curve.tip_y);
		ctx.stroke();

		let (back_x, back_y) = (
			curve.tip_x - curve.ux * ARROW_SIZE,
			curve.tip_y - curve.uy * ARROW_SIZE,
		);
		let (px, py) = (-curve.uy * ARROW_SIZE * 0.5, curve.ux * ARROW_SIZE * 0.5);
		ctx.set_fill_style_str(color);
		ctx.begin_path();
		ctx.move_to(curve.tip_x, curve.tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	for (idx, (info, sim)) in state.nodes.iter().zip(&state.sim_nodes).enumerate() {
		let (x, y) = sim.position();
		let style = &info.style;

		if let Some(halo) = &style.halo {
			ctx.begin_path();
			let _ = ctx.arc(x, y, halo.radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(halo.color);
			ctx.fill();
		}

		ctx.begin_path();
		let _ = ctx.arc(x, y, style.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(style.fill);
		ctx.fill();
		ctx.set_stroke_style_str(style.stroke);
		ctx.set_line_width(style.stroke_width);
		ctx.stroke();

		if let Some(ring) = style.contract_ring {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(3.0),
				&JsValue::from_f64(2.0),
			));
			ctx.begin_path();
			let _ = ctx.arc(x, y, ring, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("#fff");
			ctx.set_line_width(1.0);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		if state.view.selected == Some(idx) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, style.radius + 4.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(SELECTION_COLOR);
			ctx.set_line_width(2.0);
			ctx.stroke();
		}

		ctx.set_text_align("center");
		ctx.set_font("bold 10px sans-serif");
		let label_y = y - style.radius - 5.0;
		ctx.set_stroke_style_str("white");
		ctx.set_line_width(3.0);
		let _ = ctx.stroke_text(&style.label, x, label_y);
		ctx.set_fill_style_str(style.label_color);
		let _ = ctx.fill_text(&style.label, x, label_y);

		ctx.set_font("8px sans-serif");
		ctx.set_fill_style_str("#fff");
		let _ = ctx.fill_text(style.caption, x, y - style.radius + 12.0);
	}
}
