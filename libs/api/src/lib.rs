pub mod path;
pub mod recorder;
pub mod recording;
pub mod relay;
pub mod request;
pub mod response;
