pub mod model;

pub use model::{
    CallerInfo, ClientMessage, ConnectionId, RoomId, RoomMember, ServerEvent, User, UserId,
};
