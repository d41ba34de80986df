pub mod density;
pub mod grid;
pub mod justified;

pub use density::GridDensity;
pub use grid::{GridModel, GridUpdate, Viewport};
pub use justified::JustifiedLayout;
