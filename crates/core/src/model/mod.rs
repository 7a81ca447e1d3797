pub mod audio;
pub mod document;
pub mod extensions;
pub mod metadata;
pub mod quality;
pub mod segment;
pub mod speaker;
pub mod transcript;
pub mod word;

pub use audio::Audio;
pub use document::{Document, WordAssignment};
pub use extensions::{ExtensionValue, Extensions};
pub use metadata::Metadata;
pub use quality::Quality;
pub use segment::Segment;
pub use speaker::{Speaker, SpeakerId};
pub use transcript::Transcript;
pub use word::Word;
