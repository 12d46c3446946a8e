use crate::*;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Balance cell shared between the coordinating loop and one connection.
///
/// The loop is the only writer. The connection reads it to answer a UI
/// balance ping without a round trip through the event queue.
#[derive(Debug, Clone, Default)]
pub struct Purse(Arc<AtomicU64>);

impl Purse {
    pub fn get(&self) -> Tokens {
        Tokens::from_cents(self.0.load(Ordering::Acquire))
    }
    fn set(&self, tokens: Tokens) {
        self.0.store(tokens.cents(), Ordering::Release);
    }
}

/// A connected player as the loop sees it.
#[derive(Debug)]
pub struct Player {
    id: UserId,
    name: String,
    purse: Purse,
    active: bool,
}

impl Player {
    pub fn new(id: UserId, name: String, purse: Purse, balance: Tokens) -> Self {
        purse.set(balance);
        Self {
            id,
            name,
            purse,
            active: true,
        }
    }
    pub fn id(&self) -> &UserId {
        &self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn balance(&self) -> Tokens {
        self.purse.get()
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn set_balance(&mut self, tokens: Tokens) {
        self.purse.set(tokens);
    }
    pub fn credit(&mut self, tokens: Tokens) -> Result<Tokens, TokensError> {
        let balance = self.balance().try_add(tokens)?;
        self.set_balance(balance);
        Ok(balance)
    }
    pub fn eliminate(&mut self) {
        self.active = false;
    }
    /// Fresh start for a new game.
    pub fn reset(&mut self, balance: Tokens) {
        self.active = true;
        self.set_balance(balance);
    }
    /// Hands the record to a new connection, carrying the balance over.
    pub fn rebind(&mut self, purse: Purse) {
        purse.set(self.balance());
        self.purse = purse;
    }
}
