pub mod backplane;
pub mod call;
pub mod config;
pub mod error;
pub mod presence;
pub mod room;
pub mod signaling;

pub use backplane::{Backplane, Frame, FrameKind, InstanceId, RedisBackplane};
pub use config::Config;
pub use error::RelayError;
pub use presence::PresenceRegistry;
pub use room::RoomCoordinator;
pub use signaling::{RelayService, ws_handler};
