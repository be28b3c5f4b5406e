mod email_client;

pub use email_client::{Email, EmailApi, EmailClient, SenderIdentity};
