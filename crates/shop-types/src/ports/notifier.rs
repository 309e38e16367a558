use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub body: String,
    pub recipient: String,
    pub attachment: Option<Attachment>,
}

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("mail provider unreachable: {0}")]
    Transport(String),
    #[error("mail provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound transactional mail.
///
/// An unconfigured sink accepts every message and drops it.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, email: Email) -> Result<(), NotifyError>;
    /// The shop's own address, used as recipient for contact and newsletter mails.
    fn shop_address(&self) -> Option<&str>;
}
