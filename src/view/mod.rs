pub mod base_component;
pub mod components;
pub mod render_pass;
pub mod renderer_adapter;
pub mod viewport;

pub use base_component::*;
pub use components::*;
pub use renderer_adapter::*;
pub use viewport::*;
