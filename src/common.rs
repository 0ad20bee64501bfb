mod det_box;
mod detection;
mod image_batch;
mod label_table;
mod model_config;

pub use det_box::*;
pub use detection::*;
pub use image_batch::*;
pub use label_table::*;
pub use model_config::*;
