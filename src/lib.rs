pub mod burst;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod presence;
pub mod profile;

pub use burst::BurstBuffer;
pub use decoder::{Decoder, Ingest};
pub use error::DecodeError;
pub use frame::Frame;
pub use presence::{PresenceCode, PresenceReport, PresenceTracker};
pub use profile::{ProfileAnalysis, ProfilePoint};
