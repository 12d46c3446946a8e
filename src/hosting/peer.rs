use crate::hub::*;
use crate::quiz::*;
use crate::*;

/// What a connection does with one inbound text frame.
#[derive(Debug)]
pub enum Reply {
    /// Hand an event to the coordinating loop.
    Forward(Event),
    /// Answer locally without involving the loop.
    Respond(ServerMessage),
}

/// One side of the hub as seen from a connection: which events announce and
/// retire it, and how its frames translate into events.
pub trait Peer: 'static {
    fn label(&self) -> String;
    fn join(&self, outbox: Outbox) -> Event;
    fn leave(&self, conn: ID<Outbox>) -> Event;
    fn inbound(&self, text: &str) -> Result<Reply, ProtocolError>;
}

/// A viewer taking part in the game.
#[derive(Debug)]
pub struct PlayerPeer {
    user: UserId,
    name: String,
    purse: Purse,
}

impl PlayerPeer {
    pub fn new(user: UserId, name: String) -> Self {
        Self {
            user,
            name,
            purse: Purse::default(),
        }
    }
}

impl Peer for PlayerPeer {
    fn label(&self) -> String {
        format!("P {}", self.user)
    }
    fn join(&self, outbox: Outbox) -> Event {
        Event::Join {
            user: self.user.clone(),
            name: self.name.clone(),
            outbox,
            purse: self.purse.clone(),
        }
    }
    fn leave(&self, conn: ID<Outbox>) -> Event {
        Event::Leave {
            user: self.user.clone(),
            conn,
        }
    }
    fn inbound(&self, text: &str) -> Result<Reply, ProtocolError> {
        match Protocol::decode::<PlayerMessage>(text)? {
            PlayerMessage::SubmitBet { question_id, bets } => Ok(Reply::Forward(Event::SubmitWager {
                user: self.user.clone(),
                question: question_id,
                bets,
            })),
            PlayerMessage::Balance => Ok(Reply::Respond(ServerMessage::balance(self.purse.get()))),
        }
    }
}

/// The broadcaster posing questions.
#[derive(Debug, Default)]
pub struct HostPeer;

impl Peer for HostPeer {
    fn label(&self) -> String {
        "host".to_string()
    }
    fn join(&self, outbox: Outbox) -> Event {
        Event::HostJoin { outbox }
    }
    fn leave(&self, conn: ID<Outbox>) -> Event {
        Event::HostLeave { conn }
    }
    fn inbound(&self, text: &str) -> Result<Reply, ProtocolError> {
        match Protocol::decode::<HostMessage>(text)? {
            HostMessage::SubmitQuestion(draft) => Ok(Reply::Forward(Event::SubmitQuestion(draft))),
            HostMessage::NewGame => Ok(Reply::Forward(Event::NewGame)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn player_bet_becomes_wager_event() {
        let peer = PlayerPeer::new("alice".into(), "Alice".into());
        let reply = peer
            .inbound(r#"{"type":"submit_bet","question_id":"q","bets":[1,2]}"#)
            .unwrap();
        assert!(matches!(
            reply,
            Reply::Forward(Event::SubmitWager { ref user, ref bets, .. })
                if user.as_str() == "alice" && bets == &[1.0, 2.0]
        ));
    }
    #[test]
    fn player_balance_answers_locally() {
        let peer = PlayerPeer::new("alice".into(), "Alice".into());
        assert!(matches!(
            peer.inbound(r#"{"type":"balance"}"#).unwrap(),
            Reply::Respond(ServerMessage::Balance { tokens }) if tokens == Tokens::ZERO
        ));
    }
    #[test]
    fn host_cannot_bet_and_player_cannot_ask() {
        assert!(HostPeer.inbound(r#"{"type":"submit_bet","question_id":"q","bets":[]}"#).is_err());
        let peer = PlayerPeer::new("alice".into(), "Alice".into());
        assert!(peer.inbound(r#"{"type":"new_game"}"#).is_err());
    }
    #[test]
    fn leave_carries_connection() {
        let (outbox, _inbox) = Outbox::pair(1);
        let conn = outbox.id();
        assert!(matches!(HostPeer.leave(conn), Event::HostLeave { conn: c } if c == conn));
        assert!(matches!(HostPeer.join(outbox), Event::HostJoin { .. }));
    }
}
