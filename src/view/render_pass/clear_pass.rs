use crate::error::SurfaceError;
use crate::style::Color;
use crate::view::render_pass::{BitmapId, PassContext, RenderPass};

/// Overwrites every pixel of a target with one color.
pub struct ClearPass {
    color: Color,
    target: BitmapId,
}

impl ClearPass {
    pub fn new(target: BitmapId, color: Color) -> Self {
        Self { color, target }
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl RenderPass for ClearPass {
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<(), SurfaceError> {
        let mut pixels = ctx
            .surface
            .lock(self.target)
            .ok_or(SurfaceError::UnknownBitmap(self.target))?;
        pixels.clear(self.color.premultiplied());
        Ok(())
    }
}
