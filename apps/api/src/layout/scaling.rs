//! Viewport fit scaling for the fixed-size design surface.
//!
//! # Model
//! - [`fit_zoom_level`] is the pure computation: the zoom at which the surface
//!   fits the container (minus padding), times a 0.7 margin.
//! - [`ViewportFitScaler`] owns a [`ScaleState`] for one hosting view and
//!   applies the initialization latch and the compact-device orientation
//!   re-snap.
//! - [`ViewportEvents`] tracks which host listeners a scaler holds. Attaching
//!   returns an [`Attachment`] guard that releases them on drop.
//!
//! Everything here runs on the host's single UI thread; the registry uses
//! `Rc<RefCell<_>>` and the scaler is mutated through `&mut self`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::theme::PosterTheme;

/// Extra margin so a fitted poster never touches the container edges.
pub const FIT_MARGIN: f64 = 0.7;
/// Delay before a compact device re-snaps to fit after rotating.
pub const ORIENTATION_SETTLE: Duration = Duration::from_millis(100);
/// Fraction of the overflow scrolled into view when zoomed past fit.
pub const ZOOMED_SCROLL_FRACTION: f64 = 0.7;

// ────────────────────────────────────────────────────────────────────────────
// Measurements
// ────────────────────────────────────────────────────────────────────────────

/// The design surface: its true rendered size and the UI's nominal size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSize {
    pub native_width: f64,
    pub native_height: f64,
    pub display_width: f64,
    pub display_height: f64,
}

impl SurfaceSize {
    /// The A0 surface, drawn at its native point size.
    pub fn for_theme(theme: &PosterTheme) -> Self {
        Self {
            native_width: theme.width as f64,
            native_height: theme.height as f64,
            display_width: theme.width as f64,
            display_height: theme.height as f64,
        }
    }

    pub fn native_scale_factor(&self) -> f64 {
        self.native_width / self.display_width
    }

    pub fn is_valid(&self) -> bool {
        [
            self.native_width,
            self.native_height,
            self.display_width,
            self.display_height,
        ]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A container that has not been laid out yet.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceClass {
    Compact,
    #[default]
    Regular,
}

impl DeviceClass {
    pub fn from_compact(is_compact: bool) -> Self {
        if is_compact {
            DeviceClass::Compact
        } else {
            DeviceClass::Regular
        }
    }

    /// Pixels reserved around the surface.
    pub fn padding(self) -> f64 {
        match self {
            DeviceClass::Compact => 10.0,
            DeviceClass::Regular => 20.0,
        }
    }
}

/// Zoom state of one hosting view.
///
/// `actual_css_scale == manual_zoom_level * surface.native_scale_factor()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleState {
    pub manual_zoom_level: f64,
    pub fit_zoom_level: f64,
    pub actual_css_scale: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Pure computation
// ────────────────────────────────────────────────────────────────────────────

/// Zoom level at which `surface` fits `container`, or `None` for a container
/// that has no area yet.
pub fn fit_zoom_level(
    surface: &SurfaceSize,
    container: &ContainerSize,
    device: DeviceClass,
) -> Option<f64> {
    if container.is_degenerate() {
        return None;
    }
    let padding = device.padding();
    let available_width = container.width - padding;
    let available_height = container.height - padding;

    let scale_x = available_width / surface.display_width;
    let scale_y = available_height / surface.display_height;
    let fit_css_scale = scale_x.min(scale_y) * FIT_MARGIN;

    Some(fit_css_scale / surface.native_scale_factor())
}

/// CSS scale applied for a given zoom level.
pub fn css_scale(zoom_level: f64, surface: &SurfaceSize) -> f64 {
    zoom_level * surface.native_scale_factor()
}

// ────────────────────────────────────────────────────────────────────────────
// Host listener registry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViewportEvent {
    ContainerResize,
    WindowResize,
    OrientationChange,
}

/// How a scaler learns about size changes. Exactly one per scaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResizeTrigger {
    /// An observer on the supplied container element.
    ContainerObserver,
    /// Global window resize and orientation-change listeners.
    WindowEvents,
}

/// Listener counts per host event. Cloning shares the same registry.
#[derive(Debug, Clone, Default)]
pub struct ViewportEvents {
    listeners: Rc<RefCell<HashMap<ViewportEvent, usize>>>,
}

impl ViewportEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self, event: ViewportEvent) -> usize {
        self.listeners.borrow().get(&event).copied().unwrap_or(0)
    }

    pub fn is_listening(&self, event: ViewportEvent) -> bool {
        self.listener_count(event) > 0
    }

    fn register(&self, event: ViewportEvent) {
        *self.listeners.borrow_mut().entry(event).or_insert(0) += 1;
    }

    fn release(&self, event: ViewportEvent) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(count) = listeners.get_mut(&event) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                listeners.remove(&event);
            }
        }
    }
}

/// Listeners held for one scaler. Dropping the guard releases all of them.
#[derive(Debug)]
pub struct Attachment {
    events: ViewportEvents,
    trigger: ResizeTrigger,
    registered: Vec<ViewportEvent>,
}

impl Attachment {
    pub fn trigger(&self) -> ResizeTrigger {
        self.trigger
    }

    pub fn registered(&self) -> &[ViewportEvent] {
        &self.registered
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        for event in self.registered.drain(..) {
            self.events.release(event);
        }
    }
}

/// A measurement or device event delivered by the host.
#[derive(Debug, Clone, Copy)]
pub enum HostEvent {
    ContainerResized(ContainerSize),
    WindowResized(ContainerSize),
    OrientationChanged {
        container: Option<ContainerSize>,
        at: Instant,
    },
}

impl HostEvent {
    fn kind(&self) -> ViewportEvent {
        match self {
            HostEvent::ContainerResized(_) => ViewportEvent::ContainerResize,
            HostEvent::WindowResized(_) => ViewportEvent::WindowResize,
            HostEvent::OrientationChanged { .. } => ViewportEvent::OrientationChange,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stateful scaler
// ────────────────────────────────────────────────────────────────────────────

/// Keeps one view's design surface fit to its container.
#[derive(Debug, Clone)]
pub struct ViewportFitScaler {
    surface: SurfaceSize,
    device: DeviceClass,
    /// Zoom explicitly requested by the caller, if any.
    pinned_zoom: Option<f64>,
    state: ScaleState,
    initialized: bool,
    pending_snap: Option<Instant>,
    trigger: Option<ResizeTrigger>,
}

impl ViewportFitScaler {
    pub fn new(surface: SurfaceSize, device: DeviceClass, pinned_zoom: Option<f64>) -> Self {
        let manual_zoom_level = pinned_zoom.unwrap_or(1.0);
        Self {
            surface,
            device,
            pinned_zoom,
            state: ScaleState {
                manual_zoom_level,
                fit_zoom_level: 0.0,
                actual_css_scale: css_scale(manual_zoom_level, &surface),
            },
            initialized: false,
            pending_snap: None,
            trigger: None,
        }
    }

    /// Rebuilds a scaler whose view already latched, e.g. from the zoom
    /// level a client posts back. The first-fit snap will not fire again.
    pub fn restore(surface: SurfaceSize, device: DeviceClass, manual_zoom_level: f64) -> Self {
        let mut scaler = Self::new(surface, device, Some(manual_zoom_level));
        scaler.initialized = true;
        scaler
    }

    pub fn state(&self) -> ScaleState {
        self.state
    }

    pub fn surface(&self) -> &SurfaceSize {
        &self.surface
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Registers this scaler's listeners: a container observer when a
    /// container exists, window listeners otherwise. Compact devices using a
    /// container observer also listen for orientation changes to re-snap.
    pub fn attach(&mut self, events: &ViewportEvents, has_container: bool) -> Attachment {
        let (trigger, registered) = if has_container {
            let mut registered = vec![ViewportEvent::ContainerResize];
            if self.device == DeviceClass::Compact {
                registered.push(ViewportEvent::OrientationChange);
            }
            (ResizeTrigger::ContainerObserver, registered)
        } else {
            (
                ResizeTrigger::WindowEvents,
                vec![ViewportEvent::WindowResize, ViewportEvent::OrientationChange],
            )
        };
        for event in &registered {
            events.register(*event);
        }
        self.trigger = Some(trigger);
        debug!(?trigger, "Viewport scaler attached");
        Attachment {
            events: events.clone(),
            trigger,
            registered,
        }
    }

    /// Forwards a host event if the registry says someone is listening for it.
    /// Returns true when the scale state changed.
    pub fn handle(&mut self, events: &ViewportEvents, event: HostEvent) -> bool {
        if !events.is_listening(event.kind()) {
            return false;
        }
        match event {
            HostEvent::ContainerResized(container) => {
                self.trigger == Some(ResizeTrigger::ContainerObserver)
                    && self.on_container_resize(&container)
            }
            HostEvent::WindowResized(container) => {
                self.trigger == Some(ResizeTrigger::WindowEvents)
                    && self.on_container_resize(&container)
            }
            HostEvent::OrientationChanged { container, at } => {
                let mut changed = false;
                if let (Some(container), Some(ResizeTrigger::WindowEvents)) =
                    (container, self.trigger)
                {
                    changed = self.on_container_resize(&container);
                }
                self.on_orientation_change(at);
                changed
            }
        }
    }

    /// Recomputes the fit level for a new container measurement.
    ///
    /// A container without area is skipped and the previous state kept.
    /// The first successful fit snaps the manual zoom to fit when no zoom was
    /// pinned or the device is compact; later fits never touch manual zoom.
    pub fn on_container_resize(&mut self, container: &ContainerSize) -> bool {
        let Some(fit) = fit_zoom_level(&self.surface, container, self.device) else {
            debug!("Container not sized yet, keeping previous scale");
            return false;
        };

        let previous = self.state;
        self.state.fit_zoom_level = fit;

        if !self.initialized && fit > 0.0 {
            if self.device == DeviceClass::Compact || self.pinned_zoom.is_none() {
                self.state.manual_zoom_level = fit;
            }
            self.initialized = true;
        }

        self.state.actual_css_scale = css_scale(self.state.manual_zoom_level, &self.surface);
        self.state != previous
    }

    /// User-chosen zoom from the zoom controls.
    pub fn set_manual_zoom(&mut self, zoom_level: f64) {
        self.state.manual_zoom_level = zoom_level;
        self.state.actual_css_scale = css_scale(zoom_level, &self.surface);
    }

    /// Compact devices re-snap to fit once rotation settles. A second
    /// rotation inside the settle window restarts it.
    pub fn on_orientation_change(&mut self, at: Instant) {
        if self.device == DeviceClass::Compact {
            self.pending_snap = Some(at + ORIENTATION_SETTLE);
        }
    }

    /// Applies a due orientation re-snap. Returns true if one was applied.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_snap {
            Some(deadline) if now >= deadline => {
                self.pending_snap = None;
                if self.state.fit_zoom_level > 0.0 {
                    self.set_manual_zoom(self.state.fit_zoom_level);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    pub fn has_pending_snap(&self) -> bool {
        self.pending_snap.is_some()
    }

    /// CSS transform for the surface element.
    pub fn css_transform(&self) -> String {
        format!("scale({})", self.state.actual_css_scale)
    }

    /// At or below fit the host centers the surface; above it, it scrolls.
    pub fn is_fit_to_window(&self) -> bool {
        self.state.manual_zoom_level <= self.state.fit_zoom_level
    }

    /// Scroll position for a zoomed-in view, 70% of the way into the overflow.
    pub fn scroll_offset(&self, container: &ContainerSize) -> (f64, f64) {
        if self.is_fit_to_window() {
            return (0.0, 0.0);
        }
        let left = (self.surface.display_width - container.width) * ZOOMED_SCROLL_FRACTION;
        let top = (self.surface.display_height - container.height) * ZOOMED_SCROLL_FRACTION;
        (left.max(0.0), top.max(0.0))
    }
}
