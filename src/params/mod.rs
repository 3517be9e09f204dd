// Params module
// Per-frame streaming of a timeline into control parameters for visual effects

pub mod mapper;
pub mod onset;
pub mod search;
pub mod session;
pub mod smoothing;

pub use mapper::{MusicParams, ParameterMapper};
pub use onset::VoiceOnsetTracker;
pub use search::{binary_search_first_ge, binary_search_time};
pub use session::PlaybackSession;
pub use smoothing::{ExpSmoother, HarmonicSmoother, HarmonicVector};
