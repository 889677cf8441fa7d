mod coordinator;

pub use coordinator::RoomCoordinator;
