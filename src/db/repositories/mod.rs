pub mod artist;
pub mod credit;
pub mod ranking;
pub mod snapshot;
pub mod song;
pub mod video;
