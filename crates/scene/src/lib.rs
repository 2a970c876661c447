pub mod assembly;
pub mod builder;
pub mod extrude;
pub mod highlight;
pub mod mesh;
pub mod picking;
pub mod spatial;

pub use assembly::*;
pub use highlight::*;
