use glam::IVec2;

use crate::error::SurfaceError;
use crate::view::base_component::Rect;
use crate::view::render_pass::{BitmapId, PassContext, RenderPass};

/// Copies the visible part of a cached layer onto the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeLayerPass {
    layer: BitmapId,
    target: BitmapId,
    /// Region of the layer to read, in layer coordinates.
    source: Rect,
    /// Where `source` lands, in target coordinates.
    destination: Rect,
}

impl CompositeLayerPass {
    /// `full` is the layer's uncut rectangle on the target and `available` the
    /// area its parent leaves visible. Returns `None` when nothing is visible.
    pub fn new(layer: BitmapId, target: BitmapId, full: Rect, available: Rect) -> Option<Self> {
        let (source, destination) = clip_layer(full, available)?;
        Some(Self {
            layer,
            target,
            source,
            destination,
        })
    }

    pub fn source(&self) -> Rect {
        self.source
    }

    /// Also the clip handed to this layer's children.
    pub fn destination(&self) -> Rect {
        self.destination
    }
}

/// Sub-rectangle of the layer to read and the matching sub-rectangle of the
/// target to write.
pub fn clip_layer(full: Rect, available: Rect) -> Option<(Rect, Rect)> {
    let destination = full.intersect(available)?;
    let source = destination.translate(-full.origin());
    Some((source, destination))
}

impl RenderPass for CompositeLayerPass {
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<(), SurfaceError> {
        ctx.surface.copy(
            self.layer,
            self.source,
            self.target,
            IVec2::new(self.destination.x, self.destination.y),
        )
    }
}
