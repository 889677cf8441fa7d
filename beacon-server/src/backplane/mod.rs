mod frame;
mod redis;

pub use frame::{Backplane, Frame, FrameKind, InstanceId};
pub use self::redis::{FANOUT_CHANNEL, RedisBackplane};
