//! Image editing: assets, the preset source and the editor session.

mod asset;
mod placeholder;
mod session;

pub use asset::{ImageAsset, ImageFormat, ImagePayload};
pub use placeholder::{HttpPlaceholder, PlaceholderSource};
pub use session::{EditOutcome, EditRequest, ImageSession};
