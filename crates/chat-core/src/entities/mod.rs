//! Chat records as exchanged with the server and held by the client

mod channel;
mod guild;
mod message;

pub use channel::{Channel, ChannelType};
pub use guild::Guild;
pub use message::{Attachment, AuthorRecord, CachedMessage, MessageRecord, CONTENT_TYPE_PLACEHOLDER};
