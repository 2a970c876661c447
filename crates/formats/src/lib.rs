pub mod region_loader;
pub mod regions;

pub use region_loader::*;
pub use regions::*;
