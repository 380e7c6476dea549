use tokio::sync::mpsc;

use crate::chunk::StreamChunk;

/// Consumer side of a session's LLM stream. Wraps a plain `mpsc::Receiver`
/// and opportunistically merges consecutive same-kind text/status chunks
/// when the producer is outpacing the consumer. `tool_use`/`tool_result` and
/// `final` chunks always pass through untouched and in order.
pub struct CoalescingReceiver {
    rx: mpsc::Receiver<StreamChunk>,
    lookahead: Option<StreamChunk>,
}

impl CoalescingReceiver {
    pub(crate) fn new(rx: mpsc::Receiver<StreamChunk>) -> Self {
        Self { rx, lookahead: None }
    }

    /// Awaits the next (possibly merged) chunk, or `None` once the producer
    /// has dropped its sender and the channel is drained.
    pub async fn recv(&mut self) -> Option<StreamChunk> {
        let mut current = match self.lookahead.take() {
            Some(chunk) => chunk,
            None => self.rx.recv().await?,
        };

        loop {
            match self.rx.try_recv() {
                Ok(next) if current.coalesces_with(&next) => {
                    current = current.merge(next);
                }
                Ok(next) => {
                    self.lookahead = Some(next);
                    break;
                }
                Err(_) => break,
            }
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn consecutive_text_chunks_coalesce_when_backlogged() {
        let (tx, rx) = mpsc::channel(16);
        tx.send(StreamChunk::text("hel", None)).await.unwrap();
        tx.send(StreamChunk::text("lo", None)).await.unwrap();
        tx.send(StreamChunk::finish(Value::Null, None)).await.unwrap();
        drop(tx);

        let mut receiver = CoalescingReceiver::new(rx);
        let first = receiver.recv().await.unwrap();
        assert_eq!(first.content, Value::String("hello".to_string()));
        let second = receiver.recv().await.unwrap();
        assert!(second.is_final);
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn tool_use_and_tool_result_are_never_merged() {
        let (tx, rx) = mpsc::channel(16);
        tx.send(StreamChunk::tool_use(serde_json::json!({"name": "search"}), None)).await.unwrap();
        tx.send(StreamChunk::tool_result(serde_json::json!({"ok": true}))).await.unwrap();
        drop(tx);

        let mut receiver = CoalescingReceiver::new(rx);
        let first = receiver.recv().await.unwrap();
        assert_eq!(first.kind, crate::chunk::ChunkKind::ToolUse);
        let second = receiver.recv().await.unwrap();
        assert_eq!(second.kind, crate::chunk::ChunkKind::ToolResult);
    }

    #[tokio::test]
    async fn final_chunk_delivered_exactly_once() {
        let (tx, rx) = mpsc::channel(16);
        tx.send(StreamChunk::text("a", None)).await.unwrap();
        tx.send(StreamChunk::finish(Value::String("done".to_string()), None)).await.unwrap();
        drop(tx);

        let mut receiver = CoalescingReceiver::new(rx);
        let mut finals = 0;
        while let Some(chunk) = receiver.recv().await {
            if chunk.is_final {
                finals += 1;
            }
        }
        assert_eq!(finals, 1);
    }
}
