mod coordinator;

pub use coordinator::CallCoordinator;
