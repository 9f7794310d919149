use glam::IVec2;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::base_component::{Content, Element, ElementId, ElementTree, Rect};
use super::render_pass::composite_layer_pass::clip_layer;
use super::render_pass::{
    BitmapId, ClearPass, CompositeLayerPass, DrawRectPass, Fill, PassContext, RenderPass,
    RenderSurface, ScrollbarPass, TextPass,
};
use super::viewport::ViewportConfig;
use crate::image::{DecodedImage, FsImageDecoder, ImageDecoder};
use crate::style::Paint;
use crate::text::TextService;

/// What one [`RendererAdapter::render`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Layers painted from scratch this frame.
    pub repainted: usize,
    /// Layers composited from their cached bitmap.
    pub reused: usize,
    /// Subtrees skipped because they lie outside their parent's visible area.
    pub culled: usize,
    /// Layers whose bitmap could not be allocated; their stale content stays.
    pub failed: usize,
}

/// Turns a laid-out [`ElementTree`] into pixels: one cached layer per element,
/// composited front to back with each child clipped to its parent.
pub struct RendererAdapter {
    decoder: Box<dyn ImageDecoder>,
    images: FxHashMap<SmolStr, Option<DecodedImage>>,
}

impl RendererAdapter {
    pub fn new() -> Self {
        Self::with_decoder(FsImageDecoder)
    }

    pub fn with_decoder(decoder: impl ImageDecoder + 'static) -> Self {
        Self {
            decoder: Box::new(decoder),
            images: FxHashMap::default(),
        }
    }

    /// Number of image paths decoded so far, failures included.
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    pub fn render(
        &mut self,
        tree: &mut ElementTree,
        surface: &mut dyn RenderSurface,
        text: &dyn TextService,
        config: &ViewportConfig,
    ) -> FrameReport {
        let output = surface.output();
        let (width, height) = surface.output_size();
        let viewport = Rect::new(0, 0, width as i32, height as i32);
        let mut ctx = PassContext { surface, text };
        let mut report = FrameReport::default();

        if let Err(err) = ClearPass::new(output, config.clear_color).execute(&mut ctx) {
            log::warn!("[render] clear failed: {err}");
            return report;
        }
        let roots = [Some(tree.root()), tree.overlay()];
        for root in roots.into_iter().flatten() {
            self.render_element(tree, root, viewport, output, &mut ctx, config, &mut report);
        }
        report
    }

    #[allow(clippy::too_many_arguments)]
    fn render_element(
        &mut self,
        tree: &mut ElementTree,
        id: ElementId,
        available: Rect,
        output: BitmapId,
        ctx: &mut PassContext<'_>,
        config: &ViewportConfig,
        report: &mut FrameReport,
    ) {
        let Some(full) = tree.get(id).map(|element| element.layout.rect()) else {
            return;
        };
        // off-screen subtrees keep their changed flags for when they return
        let Some((_, visible)) = clip_layer(full, available) else {
            report.culled += 1;
            return;
        };

        if let Some(layer) = self.ensure_layer(tree, id, ctx, config, report)
            && let Some(mut pass) = CompositeLayerPass::new(layer, output, full, available)
            && let Err(err) = pass.execute(ctx)
        {
            log::warn!("[render] composite of {id:?} failed: {err}");
        }

        for child in tree.children(id) {
            self.render_element(tree, child, visible, output, ctx, config, report);
        }

        let Some(element) = tree.get(id) else {
            return;
        };
        if let Some(mut pass) = ScrollbarPass::new(
            output,
            &element.layout,
            element.overflow.scroll_axes(),
            visible,
            config.scrollbar_color,
        ) && let Err(err) = pass.execute(ctx)
        {
            log::warn!("[render] scrollbar of {id:?} failed: {err}");
        }
    }

    /// Returns the element's layer, repainting it first when its cache is
    /// stale. Blank elements have no layer.
    fn ensure_layer(
        &mut self,
        tree: &mut ElementTree,
        id: ElementId,
        ctx: &mut PassContext<'_>,
        config: &ViewportConfig,
        report: &mut FrameReport,
    ) -> Option<BitmapId> {
        let element = tree.get(id)?;
        let size = element.layout.max_size.max(IVec2::ZERO);
        let (width, height) = (size.x as u32, size.y as u32);
        let cache = element.render;
        if cache.is_current(width, height) {
            report.reused += 1;
            return cache.bitmap;
        }

        if width == 0 || height == 0 || is_blank(element) {
            if let Some(stale) = cache.bitmap {
                ctx.surface.release(stale);
            }
            store_cache(tree, id, None, width, height);
            report.repainted += 1;
            return None;
        }

        let bitmap = match cache.bitmap {
            Some(existing) if ctx.surface.size(existing) == Some((width, height)) => {
                if let Some(mut pixels) = ctx.surface.lock(existing) {
                    pixels.clear(0);
                }
                existing
            }
            stale => match ctx.surface.allocate(width, height) {
                Ok(fresh) => {
                    if let Some(stale) = stale {
                        ctx.surface.release(stale);
                    }
                    fresh
                }
                Err(err) => {
                    log::warn!("[render] bitmap for {id:?} failed: {err}");
                    report.failed += 1;
                    return stale;
                }
            },
        };

        if let Paint::Image(path) = &element.paint {
            self.load_image(path);
        }
        if let Err(err) = self.paint_layer(element, bitmap, ctx, config) {
            log::warn!("[render] paint of {id:?} failed: {err}");
        }
        log::trace!("[render] repainted {id:?} at {width}x{height}");
        store_cache(tree, id, Some(bitmap), width, height);
        report.repainted += 1;
        Some(bitmap)
    }

    fn load_image(&mut self, path: &SmolStr) {
        if self.images.contains_key(path) {
            return;
        }
        let decoded = match self.decoder.decode(path) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!("[render] image {path} not decoded: {err}");
                None
            }
        };
        self.images.insert(path.clone(), decoded);
    }

    fn paint_layer(
        &self,
        element: &Element,
        bitmap: BitmapId,
        ctx: &mut PassContext<'_>,
        config: &ViewportConfig,
    ) -> Result<(), crate::error::SurfaceError> {
        let size = element.layout.max_size;
        let fill = match &element.paint {
            Paint::None => Fill::None,
            Paint::Solid(color) => Fill::Solid(*color),
            Paint::HorizontalGradient(from, to) => Fill::HorizontalGradient(*from, *to),
            Paint::VerticalGradient(from, to) => Fill::VerticalGradient(*from, *to),
            Paint::Image(path) => match self.images.get(path).and_then(Option::as_ref) {
                Some(image) => Fill::Image(image),
                None => Fill::None,
            },
        };
        let border = element.border;
        let mut rect = DrawRectPass::new(bitmap, Rect::new(0, 0, size.x, size.y), fill);
        rect.set_border_widths(
            border.left as f32,
            border.right as f32,
            border.top as f32,
            border.bottom as f32,
        );
        rect.set_border_color(element.border_color);
        rect.set_border_radius(element.corner_radius as f32);
        rect.execute(ctx)?;

        let Content::Text(content) = &element.content else {
            return Ok(());
        };
        let inset = element.inset();
        let inner = Rect::new(
            inset.left,
            inset.top,
            size.x - inset.total().x,
            size.y - inset.total().y,
        );
        let mut text = TextPass::new(bitmap, content.as_str(), inner.origin(), inner.width);
        text.set_font(element.font);
        text.set_color(element.text_color);
        text.set_align(element.text_align);
        text.set_clip(Some(inner));
        if let Some(highlight) = element.highlight {
            text.set_caret(highlight.caret, config.caret_width);
            text.set_selection(highlight.selection, config.selection_color);
        }
        text.execute(ctx)
    }
}

impl Default for RendererAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Nothing to draw of its own; children still composite.
fn is_blank(element: &Element) -> bool {
    let border_visible = !element.border.is_zero() && element.border_color.alpha() > 0;
    let has_text = matches!(&element.content, Content::Text(text) if !text.is_empty())
        || element.highlight.is_some_and(|h| h.caret.is_some());
    element.paint.is_none() && !border_visible && !has_text
}

fn store_cache(tree: &mut ElementTree, id: ElementId, bitmap: Option<BitmapId>, width: u32, height: u32) {
    if let Some(element) = tree.get_mut(id) {
        element.render.bitmap = bitmap;
        element.render.width = width;
        element.render.height = height;
        element.render.changed = false;
    }
}
