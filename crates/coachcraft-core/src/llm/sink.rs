//! Incremental token delivery.

use tokio::sync::mpsc::UnboundedSender;

/// Receives content fragments as they are decoded.
///
/// Called synchronously on the decoding task, in arrival order. A slow sink
/// slows decoding down; a channel sink avoids that.
pub trait TokenSink: Send + Sync {
    /// A non-empty content fragment.
    fn on_token(&self, token: &str);

    /// A failed attempt is about to be retried from scratch.
    ///
    /// Fragments already delivered belong to the abandoned attempt; the new
    /// attempt starts again from empty content. `attempt` is 1-based, so the
    /// first call carries `2`.
    fn on_restart(&self, _attempt: u32) {}
}

impl<F> TokenSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_token(&self, token: &str) {
        self(token)
    }
}

impl TokenSink for UnboundedSender<String> {
    fn on_token(&self, token: &str) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.send(token.to_string());
    }
}
