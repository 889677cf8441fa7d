pub mod harness;
pub mod mock_backplane;

pub use harness::*;
pub use mock_backplane::*;
