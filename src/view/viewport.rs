use std::time::{Duration, Instant};

use glam::IVec2;

use super::base_component::{ElementTree, dispatch_event, hit_test, route_scroll};
use super::render_pass::text_pass::DEFAULT_CARET_WIDTH;
use super::render_pass::{RenderSurface, SoftwareSurface};
use super::renderer_adapter::{FrameReport, RendererAdapter};
use crate::error::SurfaceError;
use crate::image::ImageDecoder;
use crate::style::Color;
use crate::text::TextService;
use crate::ui::{InputEvent, UiEvent};

pub const TRACE_LAYOUT_ENV: &str = "RFCORE_TRACE_LAYOUT";
pub const TRACE_FPS_ENV: &str = "RFCORE_TRACE_FPS";

/// Presentation settings of a [`Viewport`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    pub clear_color: Color,
    pub scrollbar_color: Color,
    pub selection_color: Color,
    pub caret_width: i32,
    pub width: u32,
    pub height: u32,
    pub trace_layout: bool,
    pub trace_fps: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::WHITE,
            scrollbar_color: Color::rgba(0, 0, 0, 96),
            selection_color: Color::rgba(51, 144, 255, 96),
            caret_width: DEFAULT_CARET_WIDTH,
            width: 640,
            height: 640,
            trace_layout: false,
            trace_fps: false,
        }
    }
}

impl ViewportConfig {
    /// Defaults with the trace switches taken from the environment.
    pub fn from_env() -> Self {
        Self {
            trace_layout: std::env::var_os(TRACE_LAYOUT_ENV).is_some(),
            trace_fps: std::env::var_os(TRACE_FPS_ENV).is_some(),
            ..Self::default()
        }
    }
}

/// Per-window frame driver: drains input into the tree, then runs exactly one
/// layout and one paint per frame.
pub struct Viewport<S: RenderSurface = SoftwareSurface> {
    tree: ElementTree,
    surface: S,
    text: Box<dyn TextService>,
    renderer: RendererAdapter,
    config: ViewportConfig,
    redraw_requested: bool,
    frame_stats: FrameStats,
}

impl Viewport<SoftwareSurface> {
    /// In-memory viewport sized from `config`.
    pub fn software(
        config: ViewportConfig,
        text: impl TextService + 'static,
    ) -> Result<Self, SurfaceError> {
        let surface = SoftwareSurface::new(config.width, config.height)?;
        Ok(Self::new(surface, text, config))
    }
}

impl<S: RenderSurface> Viewport<S> {
    pub fn new(surface: S, text: impl TextService + 'static, config: ViewportConfig) -> Self {
        let mut tree = ElementTree::new();
        if config.trace_layout {
            tree.set_trace_layout(true);
        }
        Self {
            tree,
            surface,
            text: Box::new(text),
            renderer: RendererAdapter::new(),
            frame_stats: FrameStats::new(config.trace_fps),
            config,
            redraw_requested: true,
        }
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Structural edits go through here; they are picked up by the next
    /// [`render_frame`](Self::render_frame).
    pub fn tree_mut(&mut self) -> &mut ElementTree {
        self.redraw_requested = true;
        &mut self.tree
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn text(&self) -> &dyn TextService {
        self.text.as_ref()
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.config.clear_color = color;
        self.redraw_requested = true;
    }

    pub fn set_image_decoder(&mut self, decoder: impl ImageDecoder + 'static) {
        self.renderer = RendererAdapter::with_decoder(decoder);
        self.tree.mark_all_changed();
        self.redraw_requested = true;
    }

    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    pub fn redraw_requested(&self) -> bool {
        self.redraw_requested
    }

    /// Applies one drained batch of platform events. Clicks and key presses
    /// are dispatched right away; scroll deltas only accumulate and are
    /// routed once by the next frame. Returns whether a redraw is needed.
    pub fn handle_events(&mut self, events: impl IntoIterator<Item = InputEvent>) -> bool {
        for event in events {
            let changed = match event {
                InputEvent::Resize { width, height } => self.resize(width, height),
                InputEvent::Click { point } => self.click(point),
                InputEvent::Key(press) => match self.tree.active() {
                    Some(active) => dispatch_event(
                        &mut self.tree,
                        active,
                        UiEvent::KeyPress(press),
                        self.text.as_ref(),
                    ),
                    None => false,
                },
                InputEvent::Wheel { point, delta } => {
                    self.tree.gesture.accumulate(point, delta);
                    true
                }
                InputEvent::TouchBegin { point, fingers } => {
                    self.tree.gesture.active = fingers >= 2;
                    self.tree.gesture.last = point;
                    false
                }
                InputEvent::TouchMove { point } => {
                    let gesture = &mut self.tree.gesture;
                    let delta = point - gesture.last;
                    gesture.last = point;
                    if gesture.active && delta != IVec2::ZERO {
                        gesture.accumulate(point, delta);
                        true
                    } else {
                        false
                    }
                }
                InputEvent::TouchEnd => {
                    self.tree.gesture.active = false;
                    false
                }
            };
            self.redraw_requested |= changed;
        }
        self.redraw_requested
    }

    fn resize(&mut self, width: u32, height: u32) -> bool {
        match self.surface.resize_output(width, height) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("[viewport] resize to {width}x{height} failed: {err}");
                false
            }
        }
    }

    /// Moves focus away from the previously active element before the click
    /// reaches its target.
    fn click(&mut self, point: IVec2) -> bool {
        let target = hit_test(&self.tree, point);
        let mut changed = false;
        if let Some(previous) = self.tree.active()
            && Some(previous) != target
        {
            dispatch_event(&mut self.tree, previous, UiEvent::Blur, self.text.as_ref());
            self.tree.set_active(None);
            changed = true;
        }
        if let Some(target) = target {
            changed |= dispatch_event(
                &mut self.tree,
                target,
                UiEvent::Click { point },
                self.text.as_ref(),
            );
        }
        changed
    }

    /// Routes the accumulated scroll, lays the tree out and paints it.
    pub fn render_frame(&mut self) -> FrameReport {
        let frame_start = Instant::now();
        if let Some((anchor, delta)) = self.tree.gesture.take_pending() {
            let route = route_scroll(&mut self.tree, anchor, delta);
            if route.remaining != IVec2::ZERO {
                log::trace!("[viewport] scroll hit its bound, {:?} unused", route.remaining);
            }
        }
        let (width, height) = self.surface.output_size();
        self.tree
            .layout(IVec2::new(width as i32, height as i32), self.text.as_ref());
        let report = self.renderer.render(
            &mut self.tree,
            &mut self.surface,
            self.text.as_ref(),
            &self.config,
        );
        self.redraw_requested = false;
        self.frame_stats.record_frame(frame_start.elapsed(), &report);
        report
    }
}

struct FrameStats {
    enabled: bool,
    last_report_at: Instant,
    frames: u32,
    repainted: usize,
    total_frame_time: Duration,
}

impl FrameStats {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_report_at: Instant::now(),
            frames: 0,
            repainted: 0,
            total_frame_time: Duration::ZERO,
        }
    }

    fn record_frame(&mut self, frame_time: Duration, report: &FrameReport) {
        if !self.enabled {
            return;
        }

        self.frames += 1;
        self.repainted += report.repainted;
        self.total_frame_time += frame_time;

        let elapsed = self.last_report_at.elapsed();
        if elapsed < Duration::from_secs(1) {
            return;
        }

        let secs = elapsed.as_secs_f64().max(f64::EPSILON);
        let fps = self.frames as f64 / secs;
        let avg_ms = (self.total_frame_time.as_secs_f64() * 1000.0) / self.frames as f64;

        log::info!(
            "[perf ] fps={:.1} frame_avg={:.2}ms frames={} repainted={}",
            fps,
            avg_ms,
            self.frames,
            self.repainted
        );

        self.last_report_at = Instant::now();
        self.frames = 0;
        self.repainted = 0;
        self.total_frame_time = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::{Viewport, ViewportConfig};
    use crate::style::Overflow;
    use crate::text::MonoText;
    use crate::ui::{ElementHandler, EventContext, EventKind, InputEvent, UiEvent};
    use crate::view::base_component::ElementId;
    use glam::IVec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records events and takes focus on click.
    struct Probe(Rc<RefCell<Vec<EventKind>>>);

    impl ElementHandler for Probe {
        fn accepts(&self, _kind: EventKind) -> bool {
            true
        }

        fn handle(&mut self, event: &UiEvent, cx: &mut EventContext<'_>) -> bool {
            self.0.borrow_mut().push(event.kind());
            if event.kind() == EventKind::Click {
                cx.tree.set_active(Some(cx.target));
            }
            true
        }
    }

    fn viewport() -> Viewport {
        Viewport::software(ViewportConfig::default(), MonoText::default()).expect("viewport")
    }

    fn probe(viewport: &mut Viewport, height: i32) -> (ElementId, Rc<RefCell<Vec<EventKind>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let tree = viewport.tree_mut();
        let root = tree.root();
        let id = tree.append_child(root).expect("probe");
        let element = tree.get_mut(id).expect("probe");
        element.set_height(height);
        element.set_handler(Probe(log.clone()));
        (id, log)
    }

    #[test]
    fn default_config_is_a_640_square_without_traces() {
        let config = ViewportConfig::default();
        assert_eq!((config.width, config.height), (640, 640));
        assert!(!config.trace_layout && !config.trace_fps);
    }

    #[test]
    fn clicking_elsewhere_blurs_the_active_element_first() {
        let mut viewport = viewport();
        let (first, first_log) = probe(&mut viewport, 100);
        let (second, second_log) = probe(&mut viewport, 100);
        viewport.render_frame();

        viewport.handle_events([InputEvent::Click {
            point: IVec2::new(10, 10),
        }]);
        assert_eq!(viewport.tree().active(), Some(first));

        viewport.handle_events([InputEvent::Click {
            point: IVec2::new(10, 150),
        }]);
        assert_eq!(viewport.tree().active(), Some(second));
        assert_eq!(*first_log.borrow(), [EventKind::Click, EventKind::Blur]);
        assert_eq!(*second_log.borrow(), [EventKind::Click]);

        viewport.handle_events([InputEvent::Click {
            point: IVec2::new(10, 500),
        }]);
        assert_eq!(viewport.tree().active(), None);
    }

    #[test]
    fn keys_go_to_the_active_element_only() {
        let mut viewport = viewport();
        let (_, log) = probe(&mut viewport, 100);
        viewport.render_frame();
        let key = InputEvent::Key(crate::ui::KeyPress::new(crate::ui::Key::Char('a')));
        viewport.handle_events([key]);
        assert!(log.borrow().is_empty());
        viewport.handle_events([InputEvent::Click { point: IVec2::ONE }, key]);
        assert_eq!(*log.borrow(), [EventKind::Click, EventKind::KeyPress]);
    }

    #[test]
    fn scroll_deltas_accumulate_and_apply_once_per_frame() {
        let mut viewport = viewport();
        let tree = viewport.tree_mut();
        let root = tree.root();
        let list = tree.append_child(root).expect("list");
        tree.get_mut(list).expect("list").set_overflow(Overflow::ScrollY);
        for _ in 0..20 {
            let row = tree.append_child(list).expect("row");
            tree.get_mut(row).expect("row").set_height(50);
        }
        viewport.render_frame();

        let wheel = InputEvent::Wheel {
            point: IVec2::new(5, 5),
            delta: IVec2::new(0, -30),
        };
        assert!(viewport.handle_events([wheel, wheel, wheel]));
        assert_eq!(viewport.tree().get(list).expect("list").scroll_offset(), IVec2::ZERO);
        viewport.render_frame();
        assert_eq!(
            viewport.tree().get(list).expect("list").scroll_offset(),
            IVec2::new(0, -90)
        );
    }

    #[test]
    fn only_two_finger_touches_scroll() {
        let mut viewport = viewport();
        viewport.handle_events([
            InputEvent::TouchBegin {
                point: IVec2::new(0, 100),
                fingers: 1,
            },
            InputEvent::TouchMove {
                point: IVec2::new(0, 80),
            },
        ]);
        assert_eq!(viewport.tree().gesture.pending, IVec2::ZERO);

        viewport.handle_events([
            InputEvent::TouchBegin {
                point: IVec2::new(0, 100),
                fingers: 2,
            },
            InputEvent::TouchMove {
                point: IVec2::new(0, 80),
            },
            InputEvent::TouchMove {
                point: IVec2::new(0, 70),
            },
            InputEvent::TouchEnd,
        ]);
        assert_eq!(viewport.tree().gesture.pending, IVec2::new(0, -30));
        assert!(!viewport.tree().gesture.active);
    }

    #[test]
    fn resize_changes_the_layout_viewport() {
        let mut viewport = viewport();
        viewport.handle_events([InputEvent::Resize {
            width: 320,
            height: 200,
        }]);
        viewport.render_frame();
        let root = viewport.tree().root();
        assert_eq!(
            viewport.tree().get(root).expect("root").max_size(),
            IVec2::new(320, 200)
        );
    }
}
