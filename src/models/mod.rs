pub mod gallery;
pub mod image_record;
pub mod row_model;
pub mod settings_store;

pub use gallery::*;
pub use image_record::*;
pub use row_model::*;
pub use settings_store::*;
