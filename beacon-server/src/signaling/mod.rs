mod fanout;
mod service;
mod ws_handler;

pub use fanout::Fanout;
pub use service::RelayService;
pub use ws_handler::ws_handler;
