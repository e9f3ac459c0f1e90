pub mod prelude;

pub mod producer;
pub mod ranking;
pub mod snapshot;
pub mod song;
pub mod song_producer;
pub mod song_synthesizer;
pub mod song_vocalist;
pub mod synthesizer;
pub mod uploader;
pub mod video;
pub mod vocalist;
