#![forbid(unsafe_code)]

use bufwatch_core::{Config, MountError, PixelRect, Rgba, Surface};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::css::css_color;
use crate::driver::HostDriver;

/// [`Surface`] over a `<canvas>` element's 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    /// Last `fillStyle` set, to skip redundant string conversions.
    fill: Option<Rgba>,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, MountError> {
        let context = canvas
            .get_context("2d")
            .map_err(|err| MountError::SurfaceUnavailable(format!("{err:?}")))?
            .ok_or_else(|| MountError::SurfaceUnavailable("2d context not supported".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| MountError::SurfaceUnavailable("unexpected context type".into()))?;
        Ok(Self {
            canvas,
            context,
            fill: None,
        })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn set_height(&mut self, height: u32) {
        // Resizing resets the context state, fillStyle included.
        self.canvas.set_height(height);
        self.fill = None;
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        if self.fill != Some(color) {
            self.context.set_fill_style_str(&css_color(color));
            self.fill = Some(color);
        }
        self.context.fill_rect(
            f64::from(rect.x),
            f64::from(rect.y),
            f64::from(rect.width),
            f64::from(rect.height),
        );
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Live buffer-access viewer, driven from JS.
///
/// The host fetches the listing, opens the WebSocket, and forwards frames and
/// `requestAnimationFrame` timestamps; this object owns everything else.
#[wasm_bindgen]
pub struct BufWatchWeb {
    driver: Option<HostDriver<CanvasSurface>>,
}

#[wasm_bindgen]
impl BufWatchWeb {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            driver: Some(HostDriver::new(Config::default())),
        }
    }

    /// Width new `<canvas>` elements should be created with.
    #[wasm_bindgen(js_name = canvasWidth)]
    pub fn canvas_width(&self) -> u32 {
        self.driver
            .as_ref()
            .map_or(0, |driver| driver.session().config().canvas_width)
    }

    /// Replace the listing with a `GET /api/relations` body.
    #[wasm_bindgen(js_name = setEntities)]
    pub fn set_entities(&mut self, json: &str) -> Result<(), JsValue> {
        self.driver()?.set_entities(json).map_err(js_error)?;
        Ok(())
    }

    /// Select every relation; returns the ids that now need a canvas.
    #[wasm_bindgen(js_name = selectAll)]
    pub fn select_all(&mut self) -> Result<Vec<u32>, JsValue> {
        Ok(self.driver()?.select_all())
    }

    /// Flip selection of `id`; returns whether it is now selected.
    pub fn toggle(&mut self, id: u32) -> Result<bool, JsValue> {
        Ok(self.driver()?.toggle(id))
    }

    /// Start drawing `id` onto `canvas`; returns the height it was given.
    pub fn mount(&mut self, id: u32, canvas: HtmlCanvasElement) -> Result<u32, JsValue> {
        let surface = CanvasSurface::new(canvas).map_err(js_error)?;
        let geometry = self.driver()?.mount(id, surface).map_err(js_error)?;
        Ok(geometry.surface_height())
    }

    /// Stop drawing `id`; returns whether it had a canvas.
    pub fn unmount(&mut self, id: u32) -> Result<bool, JsValue> {
        Ok(self.driver()?.unmount(id).is_some())
    }

    /// Admit one binary WebSocket message received at `now_ms`.
    pub fn feed(&mut self, data: &[u8], now_ms: f64) -> Result<(), JsValue> {
        self.driver()?.feed(data, now_ms);
        Ok(())
    }

    /// Clear highlights due at `now_ms`; returns how many were cleared.
    pub fn tick(&mut self, now_ms: f64) -> Result<u32, JsValue> {
        let cleared = self.driver()?.tick(now_ms);
        Ok(u32::try_from(cleared).unwrap_or(u32::MAX))
    }

    #[wasm_bindgen(js_name = connectionOpened)]
    pub fn connection_opened(&mut self, now_ms: f64) -> Result<(), JsValue> {
        self.driver()?.connection_opened(now_ms);
        Ok(())
    }

    #[wasm_bindgen(js_name = connectionClosed)]
    pub fn connection_closed(&mut self) -> Result<(), JsValue> {
        self.driver()?.connection_closed();
        Ok(())
    }

    #[wasm_bindgen(js_name = isConnected)]
    pub fn is_connected(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(HostDriver::is_connected)
    }

    /// Earliest pending clear in `performance.now()` milliseconds.
    #[wasm_bindgen(js_name = nextDeadlineMs)]
    pub fn next_deadline_ms(&mut self) -> Option<f64> {
        self.driver.as_mut()?.next_deadline_ms()
    }

    /// Explicit teardown for JS callers: cancels pending highlights and
    /// releases every canvas.
    pub fn destroy(&mut self) {
        if let Some(driver) = self.driver.take() {
            let report = driver.teardown();
            tracing::debug!(
                cancelled = report.cancelled_decays,
                released = report.released_surfaces,
                "viewer destroyed"
            );
        }
    }
}

impl BufWatchWeb {
    fn driver(&mut self) -> Result<&mut HostDriver<CanvasSurface>, JsValue> {
        self.driver
            .as_mut()
            .ok_or_else(|| js_error("viewer already destroyed"))
    }
}

impl Default for BufWatchWeb {
    fn default() -> Self {
        Self::new()
    }
}
