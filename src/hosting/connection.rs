use super::*;
use crate::hub::*;
use crate::*;
use std::time::Duration;
use tokio::time::Instant;

/// Per-peer bridge between a WebSocket and the coordinating loop.
///
/// One task per peer multiplexes three things: frames queued in the peer's
/// [`Inbox`] are written out, inbound frames are decoded and forwarded, and a
/// ticker sends keepalive pings. Silence past the read deadline, a slow
/// write, a transport error or a close request from the loop all end the
/// session, which the loop then hears about as a leave.
pub struct Connection;

impl Connection {
    /// Registers `peer` with the loop and spawns its session task.
    pub async fn open<P, T>(peer: P, hub: HubHandle, transport: T) -> anyhow::Result<()>
    where
        P: Peer,
        T: Transport + 'static,
    {
        let (outbox, inbox) = hub.outbox();
        let conn = outbox.id();
        if !hub.send(peer.join(outbox)).await {
            anyhow::bail!("hub is not running");
        }
        log::info!("[conn {}] connected", peer.label());
        actix_web::rt::spawn(Self::run(peer, hub, transport, inbox, conn));
        Ok(())
    }

    async fn run<P, T>(peer: P, hub: HubHandle, mut transport: T, mut inbox: Inbox, conn: ID<Outbox>)
    where
        P: Peer,
        T: Transport,
    {
        let label = peer.label();
        let ping_every = hub.config().ping_interval();
        let read_deadline = hub.config().read_deadline();
        let write_deadline = hub.config().write_deadline();
        let mut ping = tokio::time::interval_at(Instant::now() + ping_every, ping_every);
        let mut seen = Instant::now();
        let reason = 'sesh: loop {
            tokio::select! {
                frame = inbox.next() => match frame {
                    Frame::Text(json) => if let Err(e) = Self::write(&mut transport, &json, write_deadline).await { break 'sesh e },
                    Frame::Close => break 'sesh "closed by hub",
                },
                msg = transport.recv() => {
                    seen = Instant::now();
                    match msg {
                        Some(Ok(Inbound::Text(text))) => match peer.inbound(&text) {
                            Ok(Reply::Forward(event)) => if !hub.send(event).await { break 'sesh "hub stopped" },
                            Ok(Reply::Respond(msg)) => if let Some(json) = Protocol::encode(&msg) {
                                if let Err(e) = Self::write(&mut transport, &json, write_deadline).await { break 'sesh e }
                            },
                            Err(e) => log::warn!("[conn {}] ignoring frame: {}", label, e),
                        },
                        Some(Ok(Inbound::Ping(bytes))) => if transport.pong(&bytes).await.is_err() { break 'sesh "pong failed" },
                        Some(Ok(Inbound::Binary)) => log::warn!("[conn {}] ignoring frame: {}", label, ProtocolError::Binary),
                        Some(Ok(Inbound::Close)) => break 'sesh "closed by peer",
                        Some(Ok(Inbound::Pong | Inbound::Other)) => continue 'sesh,
                        Some(Err(e)) => {
                            log::debug!("[conn {}] read error: {}", label, e);
                            break 'sesh "read error";
                        }
                        None => break 'sesh "stream ended",
                    }
                },
                _ = ping.tick() => if transport.ping().await.is_err() { break 'sesh "ping failed" },
                _ = tokio::time::sleep_until(seen + read_deadline) => break 'sesh "read deadline exceeded",
            }
        };
        log::info!("[conn {}] disconnected: {}", label, reason);
        transport.close().await;
        hub.send(peer.leave(conn)).await;
    }

    async fn write<T>(transport: &mut T, json: &str, deadline: Duration) -> Result<(), &'static str>
    where
        T: Transport,
    {
        match tokio::time::timeout(deadline, transport.text(json)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err("write failed"),
            Err(_) => Err("write deadline exceeded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Text(String),
        Ping,
        Pong,
        Close,
    }

    /// In-memory socket: inbound frames come from a channel, outbound ones
    /// are recorded. A stalled socket never completes a text write.
    struct Loopback {
        inbound: mpsc::UnboundedReceiver<Inbound>,
        sent: Arc<Mutex<Vec<Sent>>>,
        stalled: bool,
    }

    impl Loopback {
        fn record(&self, sent: Sent) {
            self.sent.lock().unwrap().push(sent);
        }
    }

    impl Transport for Loopback {
        async fn recv(&mut self) -> Option<anyhow::Result<Inbound>> {
            self.inbound.recv().await.map(Ok)
        }
        async fn text(&mut self, json: &str) -> anyhow::Result<()> {
            if self.stalled {
                std::future::pending::<()>().await;
            }
            self.record(Sent::Text(json.to_string()));
            Ok(())
        }
        async fn ping(&mut self) -> anyhow::Result<()> {
            self.record(Sent::Ping);
            Ok(())
        }
        async fn pong(&mut self, _: &[u8]) -> anyhow::Result<()> {
            self.record(Sent::Pong);
            Ok(())
        }
        async fn close(self) {
            self.record(Sent::Close);
        }
    }

    fn loopback(stalled: bool) -> (Loopback, mpsc::UnboundedSender<Inbound>, Arc<Mutex<Vec<Sent>>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let socket = Loopback {
            inbound: rx,
            sent: sent.clone(),
            stalled,
        };
        (socket, tx, sent)
    }

    fn config() -> Config {
        Config {
            ping_interval_secs: 25,
            read_deadline_secs: 60,
            write_deadline_secs: 10,
            ..Config::default()
        }
    }

    fn alice() -> PlayerPeer {
        PlayerPeer::new("alice".into(), "Alice".into())
    }

    fn left(event: Option<Event>, conn: ID<Outbox>) -> bool {
        matches!(event, Some(Event::Leave { user, conn: c }) if user.as_str() == "alice" && c == conn)
    }

    #[tokio::test(start_paused = true)]
    async fn silence_past_read_deadline_is_a_leave() {
        let (hub, mut events) = HubHandle::detached(config());
        let (outbox, inbox) = hub.outbox();
        let (socket, _peer, sent) = loopback(false);
        let start = Instant::now();
        Connection::run(alice(), hub, socket, inbox, outbox.id()).await;
        let lasted = start.elapsed();
        assert!(lasted >= Duration::from_secs(60) && lasted < Duration::from_secs(61));
        assert!(left(events.recv().await, outbox.id()));
        let sent = sent.lock().unwrap().clone();
        assert_eq!(sent, vec![Sent::Ping, Sent::Ping, Sent::Close]);
    }

    #[tokio::test(start_paused = true)]
    async fn any_inbound_frame_refreshes_read_deadline() {
        let (hub, mut events) = HubHandle::detached(config());
        let (outbox, inbox) = hub.outbox();
        let (socket, peer, _) = loopback(false);
        let start = Instant::now();
        let script = async {
            tokio::time::sleep(Duration::from_secs(40)).await;
            peer.send(Inbound::Pong).unwrap();
            tokio::time::sleep(Duration::from_secs(40)).await;
            peer.send(Inbound::Other).unwrap();
        };
        tokio::join!(Connection::run(alice(), hub, socket, inbox, outbox.id()), script);
        let lasted = start.elapsed();
        assert!(lasted >= Duration::from_secs(140) && lasted < Duration::from_secs(141));
        assert!(left(events.recv().await, outbox.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn close_request_from_hub_ends_session() {
        let (hub, mut events) = HubHandle::detached(config());
        let (outbox, inbox) = hub.outbox();
        let (socket, _peer, sent) = loopback(false);
        outbox.close();
        let start = Instant::now();
        Connection::run(alice(), hub, socket, inbox, outbox.id()).await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(left(events.recv().await, outbox.id()));
        assert_eq!(sent.lock().unwrap().clone(), vec![Sent::Close]);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_frame_is_ignored() {
        let (hub, mut events) = HubHandle::detached(config());
        let (outbox, inbox) = hub.outbox();
        let (socket, peer, sent) = loopback(false);
        peer.send(Inbound::Text("not json".into())).unwrap();
        peer.send(Inbound::Binary).unwrap();
        peer.send(Inbound::Ping(vec![1])).unwrap();
        peer.send(Inbound::Text(r#"{"type":"balance"}"#.into())).unwrap();
        peer.send(Inbound::Text(r#"{"type":"submit_bet","question_id":"q","bets":[1]}"#.into()))
            .unwrap();
        peer.send(Inbound::Close).unwrap();
        Connection::run(alice(), hub, socket, inbox, outbox.id()).await;
        assert!(matches!(
            events.recv().await,
            Some(Event::SubmitWager { ref bets, .. }) if bets == &[1.0]
        ));
        assert!(left(events.recv().await, outbox.id()));
        let sent = sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], Sent::Pong);
        assert!(matches!(&sent[1], Sent::Text(json) if json.contains(r#""type":"balance""#)));
        assert_eq!(sent[2], Sent::Close);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_write_hits_write_deadline() {
        let (hub, mut events) = HubHandle::detached(config());
        let (outbox, inbox) = hub.outbox();
        let (socket, _peer, sent) = loopback(true);
        outbox.deliver(r#"{"type":"eliminated"}"#.into());
        let start = Instant::now();
        Connection::run(alice(), hub, socket, inbox, outbox.id()).await;
        let lasted = start.elapsed();
        assert!(lasted >= Duration::from_secs(10) && lasted < Duration::from_secs(11));
        assert!(left(events.recv().await, outbox.id()));
        assert_eq!(sent.lock().unwrap().clone(), vec![Sent::Close]);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_frames_are_written_in_order() {
        let (hub, _events) = HubHandle::detached(config());
        let (outbox, inbox) = hub.outbox();
        let (socket, peer, sent) = loopback(false);
        outbox.deliver("1".into());
        outbox.deliver("2".into());
        let script = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            peer.send(Inbound::Close).unwrap();
        };
        tokio::join!(Connection::run(alice(), hub, socket, inbox, outbox.id()), script);
        assert_eq!(
            sent.lock().unwrap().clone(),
            vec![Sent::Text("1".into()), Sent::Text("2".into()), Sent::Close]
        );
    }
}
