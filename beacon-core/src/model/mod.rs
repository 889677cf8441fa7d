mod connection;
mod message;
mod room;
mod user;

pub use connection::ConnectionId;
pub use message::{ClientMessage, ServerEvent};
pub use room::{RoomId, RoomMember};
pub use user::{CallerInfo, User, UserId};
