pub use crate::error::Error;
pub type Result<T> = core::result::Result<T, Error>;

pub use crate::component::{Component, StateKind};
pub use crate::index_map::IndexMap;
pub use crate::stamp::{RhsEntry, Stampable};
pub use crate::waveform::Waveform;
