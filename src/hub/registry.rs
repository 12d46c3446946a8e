use super::*;
use crate::quiz::*;
use crate::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A registered player and the queue that reaches them.
#[derive(Debug)]
pub struct Seat {
    pub player: Player,
    pub outbox: Outbox,
}

/// Who is connected: every player seat plus the single host slot.
/// Owned by the coordinating loop; delivery never blocks it.
#[derive(Debug, Default)]
pub struct Registry {
    seats: BTreeMap<UserId, Seat>,
    host: Option<Outbox>,
}

impl Registry {
    pub fn contains(&self, user: &UserId) -> bool {
        self.seats.contains_key(user)
    }
    pub fn player(&self, user: &UserId) -> Option<&Player> {
        self.seats.get(user).map(|s| &s.player)
    }
    pub fn player_mut(&mut self, user: &UserId) -> Option<&mut Player> {
        self.seats.get_mut(user).map(|s| &mut s.player)
    }
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.seats.values().map(|s| &s.player)
    }
    /// Every player record, lent out for a game transition.
    pub fn players_mut(&mut self) -> Vec<&mut Player> {
        self.seats.values_mut().map(|s| &mut s.player).collect()
    }
    pub fn len(&self) -> usize {
        self.seats.len()
    }
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
    pub fn active(&self) -> usize {
        self.players().filter(|p| p.is_active()).count()
    }

    /// Seats a new player.
    pub fn sit(&mut self, player: Player, outbox: Outbox) {
        self.seats
            .insert(player.id().clone(), Seat { player, outbox });
    }
    /// Moves an existing player onto a new connection, returning the old
    /// outbox so its transport can be closed.
    pub fn rebind(&mut self, user: &UserId, outbox: Outbox, purse: Purse) -> Option<Outbox> {
        self.seats.get_mut(user).map(|seat| {
            seat.player.rebind(purse);
            std::mem::replace(&mut seat.outbox, outbox)
        })
    }
    /// Unseats `user` if `conn` is still their current connection.
    pub fn leave(&mut self, user: &UserId, conn: ID<Outbox>) -> Option<Seat> {
        match self.seats.get(user) {
            Some(seat) if seat.outbox.id() == conn => self.seats.remove(user),
            _ => None,
        }
    }
    /// Installs a host, returning the one it displaced.
    pub fn host_join(&mut self, outbox: Outbox) -> Option<Outbox> {
        self.host.replace(outbox)
    }
    /// Clears the host slot if `conn` is still the current host.
    pub fn host_leave(&mut self, conn: ID<Outbox>) -> bool {
        match &self.host {
            Some(host) if host.id() == conn => self.host.take().is_some(),
            _ => false,
        }
    }
    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }
    /// Asks `user`'s transport to close.
    pub fn close(&self, user: &UserId) {
        if let Some(seat) = self.seats.get(user) {
            seat.outbox.close();
        }
    }
    pub fn outbox(&self, user: &UserId) -> Option<&Outbox> {
        self.seats.get(user).map(|s| &s.outbox)
    }

    /// Sends a message to one player.
    pub fn unicast(&self, user: &UserId, msg: &ServerMessage) {
        match (self.seats.get(user), Protocol::encode(msg)) {
            (Some(seat), Some(json)) => Self::deliver(user.as_str(), &seat.outbox, json),
            (None, _) => log::warn!("[registry] unicast to {}: no such player", user),
            (_, None) => {}
        }
    }
    /// Sends a message to every registered player.
    pub fn broadcast(&self, msg: &ServerMessage) {
        self.fanout(msg, |_| true);
    }
    /// Sends a message to every player still in the game.
    pub fn broadcast_active(&self, msg: &ServerMessage) {
        self.fanout(msg, Player::is_active);
    }
    /// Sends a message to the host, if one is connected.
    pub fn notify_host(&self, msg: &ServerMessage) {
        if let (Some(host), Some(json)) = (&self.host, Protocol::encode(msg)) {
            Self::deliver("host", host, json);
        }
    }

    fn fanout<F>(&self, msg: &ServerMessage, filter: F)
    where
        F: Fn(&Player) -> bool,
    {
        if let Some(json) = Protocol::encode(msg) {
            self.seats
                .iter()
                .filter(|(_, seat)| filter(&seat.player))
                .for_each(|(user, seat)| Self::deliver(user.as_str(), &seat.outbox, json.clone()));
        }
    }
    fn deliver(peer: &str, outbox: &Outbox, json: Arc<str>) {
        match outbox.deliver(json) {
            Delivery::Sent => {}
            Delivery::Dropped => log::warn!("[registry] outbox full for {}, message dropped", peer),
            Delivery::Gone => log::debug!("[registry] {} already disconnected", peer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn seat(registry: &mut Registry, id: &str) -> Inbox {
        let (outbox, inbox) = Outbox::pair(4);
        let player = Player::new(id.into(), id.into(), Purse::default(), STARTING_BALANCE);
        registry.sit(player, outbox);
        inbox
    }
    #[test]
    fn stale_leave_is_ignored() {
        let mut registry = Registry::default();
        let _old = seat(&mut registry, "a");
        let stale = registry.outbox(&"a".into()).unwrap().id();
        let (fresh, _inbox) = Outbox::pair(4);
        let fresh_id = fresh.id();
        assert!(registry.rebind(&"a".into(), fresh, Purse::default()).is_some());
        assert!(registry.leave(&"a".into(), stale).is_none());
        assert!(registry.contains(&"a".into()));
        assert!(registry.leave(&"a".into(), fresh_id).is_some());
        assert!(registry.is_empty());
    }
    #[test]
    fn rebind_keeps_balance() {
        let mut registry = Registry::default();
        let _inbox = seat(&mut registry, "a");
        registry
            .player_mut(&"a".into())
            .unwrap()
            .set_balance(Tokens::whole(7));
        let purse = Purse::default();
        let (outbox, _fresh) = Outbox::pair(4);
        registry.rebind(&"a".into(), outbox, purse.clone());
        assert_eq!(purse.get(), Tokens::whole(7));
    }
    #[test]
    fn new_host_evicts_old() {
        let mut registry = Registry::default();
        let (first, _a) = Outbox::pair(4);
        let (second, _b) = Outbox::pair(4);
        let first_id = first.id();
        assert!(registry.host_join(first).is_none());
        let evicted = registry.host_join(second).unwrap();
        assert_eq!(evicted.id(), first_id);
        assert!(!registry.host_leave(first_id));
        assert!(registry.has_host());
    }
    #[test]
    fn broadcast_active_skips_eliminated() {
        let mut registry = Registry::default();
        let mut a = seat(&mut registry, "a");
        let mut b = seat(&mut registry, "b");
        registry.player_mut(&"b".into()).unwrap().eliminate();
        registry.broadcast_active(&ServerMessage::ready_for_question(1));
        assert!(a.try_next().is_some());
        assert!(b.try_next().is_none());
        registry.broadcast(&ServerMessage::ready_for_question(1));
        assert!(b.try_next().is_some());
    }
    #[test]
    fn slow_peer_does_not_block_others() {
        let mut registry = Registry::default();
        let mut fast = seat(&mut registry, "fast");
        let _slow = seat(&mut registry, "slow");
        for _ in 0..10 {
            registry.broadcast(&ServerMessage::ready_for_question(2));
            assert!(fast.try_next().is_some());
        }
    }
}
