pub use super::producer::Entity as Producer;
pub use super::ranking::Entity as Ranking;
pub use super::snapshot::Entity as Snapshot;
pub use super::song::Entity as Song;
pub use super::song_producer::Entity as SongProducer;
pub use super::song_synthesizer::Entity as SongSynthesizer;
pub use super::song_vocalist::Entity as SongVocalist;
pub use super::synthesizer::Entity as Synthesizer;
pub use super::uploader::Entity as Uploader;
pub use super::video::Entity as Video;
pub use super::vocalist::Entity as Vocalist;
