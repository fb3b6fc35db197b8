use log::debug;

/// Pan and zoom mapping from graph space to canvas pixels:
/// `screen = graph * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	fn lerp(&self, to: &ViewTransform, t: f64) -> ViewTransform {
		ViewTransform {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewportConfig {
	pub min_scale: f64,
	pub max_scale: f64,
	/// Scale factor applied per wheel notch.
	pub zoom_step: f64,
	pub reset_duration_ms: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.1,
			max_scale: 4.0,
			zoom_step: 1.1,
			reset_duration_ms: 750.0,
		}
	}
}

#[derive(Clone, Copy, Debug, Default)]
struct PanAnchor {
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

#[derive(Clone, Copy, Debug)]
struct ResetAnimation {
	from: ViewTransform,
	to: ViewTransform,
	started_at: Option<f64>,
}

fn ease_in_out_cubic(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

/// Owns the view transform and the gestures that change it.
#[derive(Clone, Debug)]
pub struct Viewport {
	transform: ViewTransform,
	config: ViewportConfig,
	width: f64,
	height: f64,
	pan: Option<PanAnchor>,
	reset: Option<ResetAnimation>,
}

impl Viewport {
	pub fn new(width: f64, height: f64, config: ViewportConfig) -> Self {
		let mut viewport = Self {
			transform: ViewTransform::default(),
			config,
			width,
			height,
			pan: None,
			reset: None,
		};
		viewport.transform = viewport.home();
		viewport
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// Unit scale with the graph origin in the middle of the canvas.
	pub fn home(&self) -> ViewTransform {
		ViewTransform {
			x: self.width / 2.0,
			y: self.height / 2.0,
			k: 1.0,
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Wheel zoom: one notch per event, sign of `delta_y` picks direction.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if delta_y == 0.0 || !delta_y.is_finite() {
			return;
		}
		let factor = if delta_y > 0.0 {
			1.0 / self.config.zoom_step
		} else {
			self.config.zoom_step
		};
		self.zoom_at(sx, sy, factor);
	}

	/// Multiply the scale by `factor` keeping the graph point under
	/// `(sx, sy)` fixed on screen.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		if !factor.is_finite() || factor <= 0.0 {
			return;
		}
		self.reset = None;
		let t = &mut self.transform;
		let new_k = (t.k * factor).clamp(self.config.min_scale, self.config.max_scale);
		let ratio = new_k / t.k;
		t.x = sx - (sx - t.x) * ratio;
		t.y = sy - (sy - t.y) * ratio;
		t.k = new_k;
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.reset = None;
		self.pan = Some(PanAnchor {
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		});
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if let Some(pan) = self.pan {
			self.transform.x = pan.transform_start_x + (sx - pan.start_x);
			self.transform.y = pan.transform_start_y + (sy - pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan = None;
	}

	/// Start animating back to [`Viewport::home`]. The clock starts on the
	/// next [`Viewport::advance`].
	pub fn reset(&mut self) {
		debug!("resetting view");
		self.pan = None;
		self.reset = Some(ResetAnimation {
			from: self.transform,
			to: self.home(),
			started_at: None,
		});
	}

	/// Step the reset animation to `now_ms`. Returns whether the transform
	/// changed.
	pub fn advance(&mut self, now_ms: f64) -> bool {
		let Some(anim) = self.reset.as_mut() else {
			return false;
		};
		let started = *anim.started_at.get_or_insert(now_ms);
		let duration = self.config.reset_duration_ms;
		let t = if duration > 0.0 {
			((now_ms - started) / duration).clamp(0.0, 1.0)
		} else {
			1.0
		};
		if t >= 1.0 {
			self.transform = anim.to;
			self.reset = None;
		} else {
			self.transform = anim.from.lerp(&anim.to, ease_in_out_cubic(t));
		}
		true
	}
}
