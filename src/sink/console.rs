//! Console sink: writes each output followed by a newline

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use super::{ForwardError, Sink};

pub struct ConsoleSink<W = Stdout> {
    writer: Mutex<W>,
}

impl ConsoleSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleSink<W>
where
    W: AsyncWrite + Send + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> Sink for ConsoleSink<W>
where
    W: AsyncWrite + Send + Unpin,
{
    fn name(&self) -> &str {
        "console"
    }

    async fn forward(&self, payload: &[u8]) -> Result<(), ForwardError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(payload).await.map_err(ForwardError::Console)?;
        writer.write_all(b"\n").await.map_err(ForwardError::Console)?;
        writer.flush().await.map_err(ForwardError::Console)
    }
}
