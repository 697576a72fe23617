pub mod handle;
pub mod source;
pub mod synthetic;

pub use handle::{MediaHandle, MediaId, MediaKind, MediaTrack, TrackKind};
pub use source::{MediaConstraints, MediaDeviceSource, MediaError};
pub use synthetic::SyntheticMediaSource;
