pub mod camera;
pub mod frame;
pub mod orbit;
pub mod renderer;

pub use camera::*;
pub use frame::*;
pub use orbit::*;
pub use renderer::*;
