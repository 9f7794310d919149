mod button;
mod text_field;

pub use button::*;
pub use text_field::*;
