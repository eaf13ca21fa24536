//! UI Components for the chat window

mod attachment_preview;
mod input_bar;
mod message_list;
mod thinking_indicator;

pub use attachment_preview::AttachmentPreview;
pub use input_bar::{InputBar, IMAGE_EXTENSIONS};
pub use message_list::MessageList;
pub use thinking_indicator::ThinkingIndicator;
