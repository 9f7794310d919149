use crate::error::SurfaceError;
use crate::text::TextService;

pub mod clear_pass;
pub mod composite_layer_pass;
pub mod draw_rect_pass;
pub(crate) mod render_target;
pub mod scrollbar_pass;
pub mod text_pass;
pub use clear_pass::ClearPass;
pub use composite_layer_pass::CompositeLayerPass;
pub use draw_rect_pass::{DrawRectPass, Fill};
pub use render_target::{
    Bitmap, BitmapId, DEFAULT_MAX_DIMENSION, PixelsMut, RenderSurface, SoftwareSurface, over,
};
pub use scrollbar_pass::ScrollbarPass;
pub use text_pass::TextPass;

/// Collaborators shared by every pass of a frame.
pub struct PassContext<'a> {
    pub surface: &'a mut dyn RenderSurface,
    pub text: &'a dyn TextService,
}

pub trait RenderPass {
    fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<(), SurfaceError>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
