pub mod labels;
pub mod layer;
pub mod sprites;

pub use labels::*;
pub use layer::*;
pub use sprites::*;
