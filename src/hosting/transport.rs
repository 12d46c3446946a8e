use actix_ws::Message;
use actix_ws::MessageStream;
use actix_ws::Session;
use futures::StreamExt;

/// An inbound WebSocket frame, reduced to what a session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Text(String),
    Binary,
    Ping(Vec<u8>),
    Pong,
    Close,
    /// Continuations and no-ops. Still proof of life.
    Other,
}

impl From<Message> for Inbound {
    fn from(msg: Message) -> Self {
        match msg {
            Message::Text(text) => Self::Text(text.to_string()),
            Message::Binary(_) => Self::Binary,
            Message::Ping(bytes) => Self::Ping(bytes.to_vec()),
            Message::Pong(_) => Self::Pong,
            Message::Close(_) => Self::Close,
            _ => Self::Other,
        }
    }
}

/// The socket a [`super::Connection`] drives.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Next inbound frame; `None` once the peer's stream has ended.
    async fn recv(&mut self) -> Option<anyhow::Result<Inbound>>;
    async fn text(&mut self, json: &str) -> anyhow::Result<()>;
    async fn ping(&mut self) -> anyhow::Result<()>;
    async fn pong(&mut self, bytes: &[u8]) -> anyhow::Result<()>;
    async fn close(self);
}

/// An upgraded actix-ws connection.
pub struct Socket {
    session: Session,
    stream: MessageStream,
}

impl Socket {
    pub fn new(session: Session, stream: MessageStream) -> Self {
        Self { session, stream }
    }
}

impl Transport for Socket {
    async fn recv(&mut self) -> Option<anyhow::Result<Inbound>> {
        self.stream.next().await.map(|msg| {
            msg.map(Inbound::from)
                .map_err(|e| anyhow::anyhow!("{}", e))
        })
    }
    async fn text(&mut self, json: &str) -> anyhow::Result<()> {
        self.session
            .text(json.to_string())
            .await
            .map_err(|_| anyhow::anyhow!("session closed"))
    }
    async fn ping(&mut self) -> anyhow::Result<()> {
        self.session
            .ping(b"")
            .await
            .map_err(|_| anyhow::anyhow!("session closed"))
    }
    async fn pong(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.session
            .pong(bytes)
            .await
            .map_err(|_| anyhow::anyhow!("session closed"))
    }
    async fn close(self) {
        let _ = self.session.close(None).await;
    }
}
