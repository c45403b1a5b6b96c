pub mod category;
pub mod detection;
pub mod field;
pub mod mask;

pub use category::{Category, CategoryMap};
pub use detection::{summarize, Detection};
pub use field::ScalarField;
pub use mask::Mask;
