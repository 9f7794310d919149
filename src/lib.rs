//! Layout and paint core of a retained-mode GUI toolkit.
//!
//! An [`ElementTree`] is laid out against a viewport, hit-tested, scrolled and
//! painted through per-element cached layers onto a [`RenderSurface`].
//! [`Viewport`] drives one layout and one paint per frame.

pub mod error;
pub mod image;
pub mod memory;
pub mod style;
pub mod text;
pub mod ui;
pub mod view;

pub use error::{DecodeError, Error, Result, SurfaceError};
pub use style::*;
pub use text::*;
pub use ui::*;
pub use view::render_pass::{Bitmap, BitmapId, RenderSurface, SoftwareSurface};
pub use view::*;
