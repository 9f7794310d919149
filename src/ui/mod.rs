mod event;
mod handler;
mod screen;

pub use event::*;
pub use handler::*;
pub use screen::*;
