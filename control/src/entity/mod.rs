pub mod recording_chunks;
pub mod recordings;
pub mod shows;
pub mod stations;
