pub mod kind;
pub mod model;
pub mod patch;
pub mod slug;
pub mod validate;

pub use kind::ItemType;
pub use model::{Document, NewDocument};
pub use patch::DocumentPatch;
