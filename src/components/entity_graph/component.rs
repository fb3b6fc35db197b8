use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, MouseEvent, TouchEvent, WheelEvent,
	Window,
};

use super::build::build_graph;
use super::details::DetailPanel;
use super::render;
use super::selection::SelectionDetails;
use super::simulation::SimulationConfig;
use super::state::{EntityGraphState, GestureMode};
use super::types::{Entity, Relationship};
use crate::error::{Error, Result};

type SharedState = Rc<RefCell<Option<EntityGraphState>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn window() -> Result<Window> {
	web_sys::window().ok_or_else(|| Error::Canvas("no global window".into()))
}

fn request_frame(window: &Window, cb: &Closure<dyn FnMut(f64)>) -> Result<i32> {
	window
		.request_animation_frame(cb.as_ref().unchecked_ref())
		.map_err(|err| Error::Canvas(format!("requestAnimationFrame failed: {err:?}")))
}

/// A self-rescheduling `requestAnimationFrame` loop. Dropping it cancels
/// the pending frame and breaks the callback's reference to itself.
struct FrameLoop {
	frame_id: Rc<Cell<Option<i32>>>,
	callback: FrameCallback,
}

impl FrameLoop {
	fn start(mut on_frame: impl FnMut(f64) + 'static) -> Result<Self> {
		let frame_id = Rc::new(Cell::new(None));
		let callback: FrameCallback = Rc::new(RefCell::new(None));
		let (id_inner, cb_inner) = (frame_id.clone(), callback.clone());

		let closure = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
			on_frame(now);
			let Some(window) = web_sys::window() else {
				return;
			};
			if let Some(ref cb) = *cb_inner.borrow() {
				id_inner.set(request_frame(&window, cb).ok());
			}
		});
		frame_id.set(Some(request_frame(&window()?, &closure)?));
		*callback.borrow_mut() = Some(closure);
		Ok(Self { frame_id, callback })
	}
}

impl Drop for FrameLoop {
	fn drop(&mut self) {
		if let (Some(id), Some(window)) = (self.frame_id.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		self.callback.borrow_mut().take();
	}
}

/// Everything a mounted graph keeps alive; dropping it tears the view down.
struct MountedGraph {
	_frames: FrameLoop,
	resize: Option<Closure<dyn FnMut()>>,
	state: SharedState,
}

impl Drop for MountedGraph {
	fn drop(&mut self) {
		if let (Some(cb), Some(window)) = (self.resize.take(), web_sys::window()) {
			let _ =
				window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		if let Ok(mut state) = self.state.try_borrow_mut() {
			if let Some(s) = state.as_mut() {
				s.stop();
			}
		}
	}
}

fn parent_width(canvas: &HtmlCanvasElement) -> f64 {
	canvas
		.parent_element()
		.map(|p| p.client_width() as f64)
		.filter(|w| *w > 0.0)
		.unwrap_or(800.0)
}

fn mount(
	canvas: HtmlCanvasElement,
	entities: &[Entity],
	relationships: &[Relationship],
	config: SimulationConfig,
	width: Option<f64>,
	height: f64,
	state: &SharedState,
) -> Result<MountedGraph> {
	let w = width.unwrap_or_else(|| parent_width(&canvas));
	canvas.set_width(w as u32);
	canvas.set_height(height as u32);

	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.map_err(|err| Error::Canvas(format!("getContext failed: {err:?}")))?
		.ok_or_else(|| Error::Canvas("2d context unavailable".into()))?
		.dyn_into()
		.map_err(|_| Error::Canvas("context is not a CanvasRenderingContext2d".into()))?;

	let graph = build_graph(entities, relationships);
	*state.borrow_mut() = Some(EntityGraphState::new(graph, config, w, height));

	let resize = width.is_none().then(|| {
		let (state_resize, canvas_resize) = (state.clone(), canvas.clone());
		Closure::<dyn FnMut()>::new(move || {
			let nw = parent_width(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, height);
			}
		})
	});
	if let Some(ref cb) = resize {
		let _ = window()?.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
	}

	let state_anim = state.clone();
	let frames = FrameLoop::start(move |now| {
		if let Some(ref mut s) = *state_anim.borrow_mut() {
			s.tick(now);
			render::render(s, &ctx);
		}
	})?;

	Ok(MountedGraph {
		_frames: frames,
		resize,
		state: state.clone(),
	})
}

/// Interactive force-directed view of an entity/relationship set.
#[component]
pub fn EntityGraphCanvas(
	#[prop(into)] entities: Signal<Vec<Entity>>,
	#[prop(into)] relationships: Signal<Vec<Relationship>>,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = 600.0)] height: f64,
	#[prop(optional)] config: SimulationConfig,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let details = RwSignal::new(None::<SelectionDetails>);

	let state_init = state.clone();
	Effect::new(move |prev: Option<Option<MountedGraph>>| {
		// The previous loop must be gone before a new one touches the state.
		drop(prev);
		let canvas = canvas_ref.get()?;
		let (entities, relationships) = (entities.get(), relationships.get());
		details.set(None);
		match mount(
			canvas,
			&entities,
			&relationships,
			config.clone(),
			width,
			height,
			&state_init,
		) {
			Ok(mounted) => Some(mounted),
			Err(err) => {
				error!("entity graph setup failed: {err}");
				None
			}
		}
	});

	let state_close = state.clone();
	Effect::new(move |_| {
		if details.with(Option::is_none) {
			if let Some(ref mut s) = *state_close.borrow_mut() {
				s.clear_selection();
			}
		}
	});

	let canvas_point = move |client_x: f64, client_y: f64| -> Option<(f64, f64)> {
		let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
		let rect = canvas.get_bounding_client_rect();
		Some((client_x - rect.left(), client_y - rect.top()))
	};

	let update_cursor = move |state: &EntityGraphState| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let cursor = match state.gesture() {
			GestureMode::DragNode { .. } | GestureMode::Pan { .. } => "grabbing",
			GestureMode::Idle | GestureMode::Pinch { .. } => "grab",
		};
		let _ = HtmlElement::style(&canvas).set_property("cursor", cursor);
	};

	let publish = move |state: &SharedState| {
		let selected = state.borrow().as_ref().and_then(EntityGraphState::selection_details);
		details.set(selected);
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(ev.client_x() as f64, ev.client_y() as f64) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
			update_cursor(s);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(ev.client_x() as f64, ev.client_y() as f64) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let changed = state_mu.borrow_mut().as_mut().is_some_and(|s| {
			let changed = s.pointer_up();
			update_cursor(s);
			changed
		});
		if changed {
			publish(&state_mu);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
			update_cursor(s);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(ev.client_x() as f64, ev.client_y() as f64) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	let touch_points = move |ev: &TouchEvent| -> Vec<(f64, f64)> {
		let touches = ev.touches();
		(0..touches.length().min(2))
			.filter_map(|i| touches.get(i))
			.filter_map(|t| canvas_point(t.client_x() as f64, t.client_y() as f64))
			.collect()
	};

	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(&ev);
		if let Some(ref mut s) = *state_ts.borrow_mut() {
			match points.as_slice() {
				[a, b] => s.begin_pinch(*a, *b),
				[(x, y)] => s.pointer_down(*x, *y),
				_ => {}
			}
		}
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(&ev);
		if let Some(ref mut s) = *state_tm.borrow_mut() {
			match points.as_slice() {
				[a, b] => s.pinch_to(*a, *b),
				[(x, y)] => s.pointer_move(*x, *y),
				_ => {}
			}
		}
	};

	let state_te = state.clone();
	let on_touchend = move |ev: TouchEvent| {
		if ev.touches().length() > 0 {
			return;
		}
		let changed = state_te
			.borrow_mut()
			.as_mut()
			.is_some_and(EntityGraphState::pointer_up);
		if changed {
			publish(&state_te);
		}
	};

	let state_reset = state.clone();
	let on_reset = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_reset.borrow_mut() {
			s.reset_view();
		}
	};

	view! {
		<div class="entity-graph" style=format!("height: {height}px;")>
			<canvas
				node_ref=canvas_ref
				class="entity-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				style="display: block; cursor: grab;"
			/>
			<button class="entity-graph-reset" title="Reset View" on:click=on_reset>
				"⟲"
			</button>
			<div class="entity-graph-help">
				"Pan: Drag background | Zoom: Scroll | Nodes: Drag & Click"
			</div>
			<DetailPanel details=details />
		</div>
	}
}
