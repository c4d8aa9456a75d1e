mod reply_to_address;
mod source_page;
mod submission;

pub use reply_to_address::ReplyToAddress;
pub use source_page::SourcePage;
pub use submission::{render_subject, Submission};
