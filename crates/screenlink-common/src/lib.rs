pub mod errors;
pub mod id;

pub use errors::{
    ConfigError, RelayError, ScreenlinkError, CLOSE_NORMAL, CLOSE_POLICY_VIOLATION,
};
pub use id::{new_id, PeerId};

pub type Result<T> = std::result::Result<T, ScreenlinkError>;
