use async_trait::async_trait;

use crate::Result;

/// Delivers text into a thread of a destination group.
///
/// `Ok(())` means the destination confirmed the message.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_text(&self, destination: i64, thread_id: i32, text: &str) -> Result<()>;
}
