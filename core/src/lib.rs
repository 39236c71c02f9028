//! Root of the `scotty-core` library.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the `ConversationView` abstraction.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod default_client;
pub mod error;
pub mod poller;
pub mod sidebar;
pub mod state;
pub mod view;

pub use backend::ChatBackend;
pub use backend::HttpBackend;
pub use controller::ControllerOptions;
pub use controller::PageContext;
pub use controller::ViewController;
pub use error::ChatErr;
pub use error::Failure;
pub use poller::PollTick;
pub use poller::poll_channel;
pub use view::ConversationView;
