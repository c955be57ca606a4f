pub mod controller;
pub mod error;
pub mod page;
pub mod render;
pub mod store;
pub mod transport;
pub mod ws;

pub use controller::{ChatController, Key, SendOutcome, REQUIRED_FIELDS_ALERT};
pub use error::ClientError;
pub use page::{Page, PageVariant};
pub use render::{HtmlRenderer, Renderer, TextRenderer};
pub use store::{FileUserStore, MemoryUserStore, UserStore};
pub use transport::{Handlers, Transport};
pub use ws::WsTransport;
