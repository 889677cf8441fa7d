mod registry;

pub use registry::PresenceRegistry;
