//! Event-driven navigator: keeps the off-screen proxies current, reacts to
//! hover and selection, flies the camera along planned itineraries and records
//! where it has been.

use crate::history::FlightHistory;
use crate::host::ViewportHost;
use crate::settings::NavigatorSettings;
use crate::timers::TimerHost;
use bezel_core::{FlightPreset, LandmarkId, NavigationError, Rgba};
use bezel_events::{Event, EventBus, InputEvent, Key, MouseButton, NavPhase, TimerKind};
use bezel_graph::{
    CameraPoint, FlightMap, FlightMapBuilder, FlightPlanner, Graph, Itinerary, LandmarkSet,
    OffScreenProxy, OverlayShape, PickResult, ProxyGeometry, ProxyGeometryBuilder, ProxyHitTester,
    ProxyTarget, Vec2, compute_proxies,
};

/// A flight in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub landmark: LandmarkId,
    pub itinerary: Itinerary,
    /// Index of the itinerary point the next tick moves to.
    pub next: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum NavState {
    #[default]
    Start,
    Stopped,
    Moving,
    Hovering {
        landmark: LandmarkId,
    },
    Flying(Flight),
}

impl NavState {
    pub fn phase(&self) -> NavPhase {
        match self {
            NavState::Start => NavPhase::Start,
            NavState::Stopped => NavPhase::Stopped,
            NavState::Moving => NavPhase::Moving,
            NavState::Hovering { .. } => NavPhase::Hovering,
            NavState::Flying(_) => NavPhase::Flying,
        }
    }
}

/// The graph and landmark set the navigator works on.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub graph: Graph,
    pub landmarks: LandmarkSet,
}

pub struct NavigationController<H, T> {
    host: H,
    timers: T,
    settings: NavigatorSettings,
    model: Option<Model>,
    flight_maps: FlightMapBuilder,
    geometry_builder: ProxyGeometryBuilder,
    planner: FlightPlanner,
    hit_tester: ProxyHitTester,
    proxies: Vec<OffScreenProxy>,
    history: FlightHistory,
    bus: EventBus,
    state: NavState,
    enabled: bool,
    pointer: Vec2,
    dim_factor: f32,
    dim_steps: u32,
    highlighted: Option<LandmarkId>,
    label_visible: bool,
    last_diagnostic: Option<String>,
}

impl<H: ViewportHost, T: TimerHost> NavigationController<H, T> {
    pub fn new(host: H, timers: T, settings: NavigatorSettings) -> Self {
        let settings = settings.validated();
        let mut controller = Self {
            host,
            timers,
            flight_maps: FlightMapBuilder::new(settings.flight_preset.into()),
            geometry_builder: ProxyGeometryBuilder::default(),
            planner: FlightPlanner::default(),
            hit_tester: ProxyHitTester::new(),
            proxies: Vec::new(),
            history: FlightHistory::new(settings.history_length),
            bus: EventBus::new(),
            state: NavState::Start,
            enabled: false,
            pointer: Vec2::ZERO,
            dim_factor: 1.0,
            dim_steps: 0,
            highlighted: None,
            label_visible: false,
            last_diagnostic: None,
            model: None,
            settings,
        };
        controller.sync_geometry_builder();
        controller
    }

    // ---- accessors ----

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn phase(&self) -> NavPhase {
        self.state.phase()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.state, NavState::Flying(_))
    }

    pub fn flight(&self) -> Option<&Flight> {
        match &self.state {
            NavState::Flying(flight) => Some(flight),
            _ => None,
        }
    }

    pub fn settings(&self) -> &NavigatorSettings {
        &self.settings
    }

    pub fn history(&self) -> &FlightHistory {
        &self.history
    }

    pub fn proxies(&self) -> &[OffScreenProxy] {
        &self.proxies
    }

    /// Undimmed overlay geometry from the last refresh.
    pub fn geometry(&self) -> &ProxyGeometry {
        self.hit_tester.geometry()
    }

    /// Overlay geometry with the current dimming applied.
    pub fn displayed_geometry(&self) -> ProxyGeometry {
        let mut geometry = self.hit_tester.geometry().clone();
        geometry.dim(self.dim_factor);
        geometry
    }

    /// Shapes of the hovered landmark, recoloured for the highlight layer.
    pub fn highlight_shapes(&self) -> Vec<OverlayShape> {
        let Some(landmark) = self.highlighted else {
            return Vec::new();
        };
        self.hit_tester
            .geometry()
            .shapes_for(landmark)
            .map(|shape| OverlayShape {
                color: Rgba::HIGHLIGHT,
                opacity: Rgba::HIGHLIGHT.a,
                ..shape.clone()
            })
            .collect()
    }

    pub fn highlighted(&self) -> Option<LandmarkId> {
        self.highlighted
    }

    pub fn bezel_opacity(&self) -> f32 {
        self.settings.bezel_opacity * self.dim_factor
    }

    /// Multiplier currently applied to every proxy alpha.
    pub fn dim_factor(&self) -> f32 {
        self.dim_factor
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Mutable access to the graph and landmarks. Changes bump revisions, so
    /// the flight map is rebuilt before the next flight; call
    /// [`Self::refresh`] to update the proxies right away.
    pub fn model_mut(&mut self) -> Option<&mut Model> {
        self.model.as_mut()
    }

    /// Last built flight map, possibly stale.
    pub fn flight_map(&self) -> Option<&FlightMap> {
        self.flight_maps.current()
    }

    pub fn pick(&self, position: Vec2) -> PickResult {
        self.hit_tester.hit_test(position)
    }

    // ---- model and settings ----

    pub fn set_model(&mut self, graph: Graph, landmarks: LandmarkSet) {
        tracing::debug!(
            vertices = graph.vertex_count(),
            landmarks = landmarks.len(),
            "Setting navigator model"
        );
        self.model = Some(Model { graph, landmarks });
        self.flight_maps.invalidate();
        if let Err(e) = self.rebuild_flight_map().map(|_| ()) {
            self.report(&e);
        }
        self.refresh_or_report();
    }

    pub fn clear_model(&mut self) {
        self.cancel_flight();
        self.model = None;
        self.flight_maps.invalidate();
        self.hit_tester.clear();
        self.proxies.clear();
        self.set_highlight(None);
        self.hide_label();
    }

    /// Rebuild the flight map if the model or the weights changed.
    pub fn rebuild_flight_map(&mut self) -> Result<&FlightMap, NavigationError> {
        let model = self.model.as_ref().ok_or(NavigationError::NoModel)?;
        Ok(self.flight_maps.update(&model.graph, &model.landmarks))
    }

    /// Replace all settings and apply them.
    pub fn set_settings(&mut self, settings: NavigatorSettings) {
        self.settings = settings.validated();
        self.apply_settings();
    }

    /// Edit settings in place and apply them.
    pub fn update_settings(&mut self, edit: impl FnOnce(&mut NavigatorSettings)) {
        let mut settings = self.settings.clone();
        edit(&mut settings);
        self.set_settings(settings);
    }

    pub fn set_flight_preset(&mut self, preset: FlightPreset) {
        self.update_settings(|s| s.flight_preset = preset);
    }

    pub fn set_flight_speed_bias(&mut self, bias: i32) {
        self.update_settings(|s| s.flight_speed_bias = bias);
    }

    /// Set the bezel colour. Its alpha becomes the undimmed bezel opacity.
    pub fn set_bezel_color(&mut self, color: Rgba) {
        self.update_settings(|s| {
            s.bezel_color = color.with_alpha(1.0);
            s.bezel_opacity = color.a;
        });
        self.dim_factor = 1.0;
        self.dim_steps = 0;
        self.publish_opacity();
    }

    fn apply_settings(&mut self) {
        self.flight_maps.set_preset(self.settings.flight_preset);
        self.history.set_capacity(self.settings.history_length);
        self.sync_geometry_builder();
        if self.enabled {
            self.refresh_or_report();
        }
    }

    fn sync_geometry_builder(&mut self) {
        let s = &self.settings;
        let builder = &mut self.geometry_builder;
        builder.reduce_overlaps = s.reduce_overlaps;
        builder.show_error = s.show_error;
        builder.world_size = s.world_size;
        builder.bezel_color = s.bezel_color;
        builder.bezel_opacity = s.bezel_opacity;
    }

    // ---- lifecycle ----

    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        tracing::debug!("Enabling navigator");
        self.enabled = true;
        self.timers
            .schedule(TimerKind::Stop, self.settings.stop_timer_ms);
        self.set_state(NavState::Stopped);
        self.refresh_or_report();
    }

    /// Stop every timer and release picking state.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        tracing::debug!("Disabling navigator");
        self.cancel_flight();
        self.timers.cancel_all();
        self.enabled = false;
        self.hide_label();
        self.set_highlight(None);
        self.hit_tester.clear();
        self.proxies.clear();
        self.restore_dim();
    }

    /// Recompute landmark centres, off-screen proxies and overlay geometry for
    /// the current camera. Returns the number of proxies.
    pub fn refresh(&mut self) -> Result<usize, NavigationError> {
        let model = self.model.as_ref().ok_or(NavigationError::NoModel)?;
        let centers = model
            .landmarks
            .centers(&model.graph, self.settings.hull_shape);
        let proxies = compute_proxies(&centers, &self.host, self.settings.reduce_overlaps);
        let world_size = self
            .geometry_builder
            .world_size_for(model.graph.bounds(), &centers);
        let geometry = match self.geometry_builder.build(&proxies, world_size, &self.host) {
            Ok(geometry) => geometry,
            Err(e) => {
                self.hit_tester.clear();
                self.proxies.clear();
                return Err(e);
            }
        };
        self.hit_tester.update(&geometry);
        let count = proxies.len();
        if count != self.proxies.len() {
            tracing::debug!(count, "Off-screen proxies changed");
        }
        self.proxies = proxies;
        self.bus.publish(Event::ProxiesUpdated { count });
        Ok(count)
    }

    // ---- event dispatch ----

    /// Process one host event. Failures are logged and published as
    /// [`Event::Diagnostic`]; the state machine stays consistent.
    pub fn handle(&mut self, event: InputEvent) {
        if !self.enabled {
            tracing::trace!(?event, "Navigator disabled, ignoring event");
            return;
        }
        match event {
            InputEvent::PointerMove { position }
            | InputEvent::Wheel { position, .. }
            | InputEvent::ButtonPress {
                button: MouseButton::Middle | MouseButton::Right,
                position,
            } => self.on_move(position),
            InputEvent::ButtonPress {
                button: MouseButton::Left,
                position,
            } => {
                self.pointer = position;
                if let Err(e) = self.select(position) {
                    self.report(&e);
                }
            }
            InputEvent::PointerLeave => {
                self.timers.cancel(TimerKind::Stop);
                self.timers.cancel(TimerKind::Hover);
            }
            InputEvent::KeyPress { key: Key::Escape } => {
                self.cancel_flight();
            }
            InputEvent::KeyPress { key: Key::Left } => {
                self.history_back();
            }
            InputEvent::KeyPress { key: Key::Right } => {
                self.history_forward();
            }
            InputEvent::Timer { kind } => self.on_timer(kind),
        }
    }

    fn on_move(&mut self, position: Vec2) {
        self.pointer = position;
        if self.state == NavState::Stopped {
            self.restore_dim();
            self.timers.cancel(TimerKind::Dimmer);
        }
        self.timers
            .schedule(TimerKind::Stop, self.settings.stop_timer_ms);
        self.timers
            .schedule(TimerKind::Hover, self.settings.hover_timer_ms);
        if !self.is_flying() {
            self.set_state(NavState::Moving);
        }
        self.refresh_or_report();
    }

    fn on_timer(&mut self, kind: TimerKind) {
        if !self.timers.is_active(kind) {
            tracing::trace!(?kind, "Ignoring inactive timer");
            return;
        }
        match kind {
            TimerKind::Hover => self.on_hover_timer(),
            TimerKind::Stop => self.on_stop_timer(),
            TimerKind::Dimmer => self.on_dimmer_timer(),
            TimerKind::Flight => self.on_flight_timer(),
        }
    }

    fn on_hover_timer(&mut self) {
        self.timers.cancel(TimerKind::Hover);
        if self.is_flying() {
            return;
        }
        match self.hit_tester.hit_test(self.pointer) {
            PickResult::Proxy(target) => {
                self.timers.cancel(TimerKind::Stop);
                self.show_label(&target);
                self.set_highlight(Some(target.landmark));
                self.set_state(NavState::Hovering {
                    landmark: target.landmark,
                });
            }
            PickResult::Bezel | PickResult::None => {
                self.hide_label();
                self.set_highlight(None);
                if matches!(self.state, NavState::Hovering { .. }) {
                    // Hovering cancelled the stop timer; restart it so the
                    // overlay can still settle and dim.
                    self.set_state(NavState::Moving);
                    self.timers
                        .schedule(TimerKind::Stop, self.settings.stop_timer_ms);
                }
            }
        }
    }

    fn on_stop_timer(&mut self) {
        self.timers.cancel(TimerKind::Stop);
        if self.state != NavState::Moving {
            return;
        }
        self.set_state(NavState::Stopped);
        self.hide_label();
        self.set_highlight(None);
        if self.settings.auto_dim {
            self.dim_steps = 0;
            self.timers
                .schedule(TimerKind::Dimmer, self.settings.dimmer_timer_ms);
        }
    }

    fn on_dimmer_timer(&mut self) {
        if self.state != NavState::Stopped {
            return;
        }
        if self.dim_steps < self.settings.num_dim_steps {
            self.dim_factor *= 1.0 - self.settings.step_dimness;
            self.dim_steps += 1;
            self.publish_opacity();
        }
        if self.dim_steps >= self.settings.num_dim_steps {
            tracing::debug!(steps = self.dim_steps, "Dimming complete");
            self.timers.cancel(TimerKind::Dimmer);
        }
    }

    fn on_flight_timer(&mut self) {
        let NavState::Flying(flight) = &mut self.state else {
            return;
        };
        let point = flight.itinerary.points.get(flight.next).copied();
        flight.next += 1;
        let landed = flight.next >= flight.itinerary.len();

        if let Some(point) = point {
            self.history.push(point);
            self.move_camera(point);
        }
        if landed {
            tracing::info!("Flight landed");
            self.timers.cancel(TimerKind::Flight);
            self.set_state(NavState::Stopped);
            self.bus.publish(Event::FlightPathCleared);
            self.bus.publish(Event::FlightCompleted);
        }
    }

    // ---- operations ----

    /// Pick a proxy at `position` and fly to its landmark. Returns whether a
    /// flight started; a miss or an ongoing flight is not an error.
    pub fn select(&mut self, position: Vec2) -> Result<bool, NavigationError> {
        if self.is_flying() {
            return Ok(false);
        }
        if self.model.is_none() {
            return Err(NavigationError::NoFlightMap);
        }
        if self.hit_tester.geometry().proxies.is_empty() {
            return Err(NavigationError::NoProxies);
        }
        let Some(target) = self.hit_tester.hit_test_proxies(position).cloned() else {
            tracing::trace!(x = position.x, y = position.y, "Select missed every proxy");
            return Ok(false);
        };
        self.fly_to(&target)?;
        Ok(true)
    }

    /// Plan a flight from the view centre to `target` and lift off.
    pub fn fly_to(&mut self, target: &ProxyTarget) -> Result<(), NavigationError> {
        let model = self.model.as_ref().ok_or(NavigationError::NoFlightMap)?;
        let map = self.flight_maps.update(&model.graph, &model.landmarks);
        let start = self.host.camera();
        let departure = self.host.display_to_world(self.host.display_center());
        let itinerary = self.planner.plan(
            map,
            departure,
            target.arrival,
            start.zoom,
            model.graph.bounds(),
        );
        let Some(&first) = itinerary.route.points.first() else {
            tracing::debug!("Empty itinerary, not flying");
            return Ok(());
        };

        // Taxi to the start of the route at the current zoom.
        self.bus.publish(Event::FlightPathHighlighted {
            points: vec![departure, first],
            connected: true,
        });
        self.move_camera(CameraPoint::new(first.x, first.y, start.zoom));
        self.bus.publish(Event::FlightPathCleared);

        let connected = itinerary.connected();
        self.bus.publish(Event::FlightPathHighlighted {
            points: itinerary.route.points.clone(),
            connected,
        });

        let period_ms = self.settings.flight_period_ms();
        self.timers.schedule(TimerKind::Flight, period_ms);
        self.history
            .push(CameraPoint::new(departure.x, departure.y, start.zoom));
        tracing::info!(
            landmark = %target.landmark,
            points = itinerary.len(),
            connected,
            period_ms,
            "Lift off"
        );
        self.bus.publish(Event::FlightStarted {
            landmark: target.landmark,
            points: itinerary.len(),
            connected,
        });
        self.set_state(NavState::Flying(Flight {
            landmark: target.landmark,
            itinerary,
            next: 0,
        }));
        Ok(())
    }

    /// Abandon the current flight. Returns false if nothing was flying.
    pub fn cancel_flight(&mut self) -> bool {
        if !self.is_flying() {
            return false;
        }
        tracing::info!("Flight cancelled");
        self.timers.cancel(TimerKind::Flight);
        self.set_state(NavState::Stopped);
        self.bus.publish(Event::FlightPathCleared);
        self.bus.publish(Event::FlightCancelled);
        true
    }

    /// Move the camera to the previous history entry.
    pub fn history_back(&mut self) -> Option<CameraPoint> {
        let point = self.history.back()?;
        self.visit_history(point);
        Some(point)
    }

    /// Move the camera to the next history entry.
    pub fn history_forward(&mut self) -> Option<CameraPoint> {
        let point = self.history.forward()?;
        self.visit_history(point);
        Some(point)
    }

    fn visit_history(&mut self, point: CameraPoint) {
        self.move_camera(point);
        self.bus.publish(Event::HistoryMoved {
            index: self.history.cursor(),
            len: self.history.len(),
        });
    }

    // ---- helpers ----

    fn move_camera(&mut self, point: CameraPoint) {
        self.host.move_camera_to(point);
        let pose = self.host.camera();
        self.bus.publish(Event::CameraMoved {
            x: pose.x,
            y: pose.y,
            zoom: pose.zoom,
        });
        self.refresh_or_report();
    }

    fn set_state(&mut self, state: NavState) {
        let (from, to) = (self.state.phase(), state.phase());
        self.state = state;
        if from != to {
            tracing::debug!(%from, %to, "Navigator state change");
            self.bus.publish(Event::StateChanged { from, to });
        }
    }

    fn show_label(&mut self, target: &ProxyTarget) {
        self.label_visible = true;
        self.bus.publish(Event::LabelShown {
            landmark: target.landmark,
            label: target.label.clone(),
            position: self.pointer,
        });
    }

    fn hide_label(&mut self) {
        if self.label_visible {
            self.label_visible = false;
            self.bus.publish(Event::LabelHidden);
        }
    }

    fn set_highlight(&mut self, landmark: Option<LandmarkId>) {
        if self.highlighted != landmark {
            self.highlighted = landmark;
            self.bus.publish(Event::HighlightChanged { landmark });
        }
    }

    fn restore_dim(&mut self) {
        let dimmed = self.dim_steps > 0 || self.dim_factor != 1.0;
        self.dim_factor = 1.0;
        self.dim_steps = 0;
        if dimmed {
            self.publish_opacity();
        }
    }

    fn publish_opacity(&self) {
        self.bus.publish(Event::OpacityChanged {
            bezel: self.bezel_opacity(),
            proxy_factor: self.dim_factor,
        });
    }

    fn refresh_or_report(&mut self) {
        match self.refresh() {
            Ok(_) => self.last_diagnostic = None,
            Err(e) => self.report(&e),
        }
    }

    /// Log a skipped operation and publish it, once per distinct message.
    fn report(&mut self, error: &NavigationError) {
        let message = error.to_string();
        if self.last_diagnostic.as_deref() == Some(message.as_str()) {
            tracing::debug!("{}", message);
            return;
        }
        tracing::warn!("{}", message);
        self.last_diagnostic = Some(message.clone());
        self.bus.publish(Event::Diagnostic { message });
    }
}
