mod email_address;
mod required_text;

pub use email_address::EmailAddress;
pub use required_text::RequiredText;
