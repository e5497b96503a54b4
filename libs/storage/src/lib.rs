pub mod config;
pub mod operator;
pub mod path;
pub mod publish;


pub use config::StorageConfig;
pub use operator::{create_operator, init_operator};
pub use path::{is_safe_component, public_url, recording_object_path, validate_path};
pub use publish::Publisher;
