//! Live elimination betting quiz.
//!
//! A host streams to many viewers and poses multiple-choice questions. Every
//! connected player spreads a wager of tokens across the options; anyone who
//! leaves the correct option unstaked is eliminated, and wrong-option stakes
//! pool into a jackpot that the last survivor claims.
//!
//! ## Architecture
//!
//! - [`quiz`]: Pure game domain: questions, wagers, ledger, settlement, state machine
//! - [`hub`]: Single coordinating loop that owns all game and registry state
//! - [`accounts`]: Collaborator seam for the persistent off-chain balance
//! - `hosting`: actix-web WebSocket surface and per-peer connection loops
//!
//! Connection handles never touch game state. They turn frames into
//! [`hub::Event`]s, and the hub answers through each peer's bounded [`hub::Outbox`].
#![allow(dead_code)]

pub mod accounts;
pub mod config;
pub mod error;
pub mod hub;
pub mod quiz;
pub mod tokens;

#[cfg(feature = "server")]
pub mod hosting;

pub use config::Config;
pub use error::*;
pub use tokens::Tokens;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
}

impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> std::str::FromStr for ID<T> {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self::from)
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self::from(uuid::Uuid::now_v7())
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

/// Opaque user identity handed to us by the authenticating front end.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// GAME PARAMETERS
// ============================================================================
/// Tokens granted to every player on join.
pub const STARTING_BALANCE: Tokens = Tokens::whole(50);
/// Fewest answer options a question may offer.
pub const MIN_OPTIONS: usize = 2;
/// Most answer options a question may offer.
pub const MAX_OPTIONS: usize = 4;
/// Pause between a settlement and the next queued question going live (seconds).
pub const COOLDOWN_SECS: u64 = 3;
/// Delay between an elimination notice and the forced disconnect (seconds).
pub const ELIMINATION_GRACE_SECS: u64 = 2;

// ============================================================================
// TRANSPORT PARAMETERS
// ============================================================================
/// Capacity of each peer's outbound queue. Fan-out drops the newest message when full.
pub const OUTBOX_CAPACITY: usize = 64;
/// Capacity of the hand-off queue feeding the coordinating loop.
pub const EVENT_CAPACITY: usize = 1024;
/// Interval between keepalive pings (seconds).
pub const PING_INTERVAL_SECS: u64 = 30;
/// Silence after which a peer is considered dead (seconds).
pub const READ_DEADLINE_SECS: u64 = 60;
/// Longest a single frame write may take (seconds).
pub const WRITE_DEADLINE_SECS: u64 = 10;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Milliseconds since the unix epoch, as sent to clients for countdowns.
pub fn unix_millis(t: std::time::SystemTime) -> i64 {
    t.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() -> anyhow::Result<()> {
    std::fs::create_dir_all("logs")?;
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time))?,
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file])?;
    Ok(())
}

/// Register Ctrl+C handler for immediate (non-graceful) termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            log::warn!("violent interrupt received, exiting immediately");
            std::process::exit(0);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn id_roundtrips_through_str() {
        struct Marker;
        let id = ID::<Marker>::default();
        let parsed = id.to_string().parse::<ID<Marker>>().unwrap();
        assert_eq!(id, parsed);
    }
    #[test]
    fn user_id_is_transparent_on_the_wire() {
        let id = UserId::from("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
    }
}
