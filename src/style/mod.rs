mod box_model;
mod color;
mod paint;

pub use box_model::*;
pub use color::*;
pub use paint::*;
