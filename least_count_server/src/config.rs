//! Command line and environment configuration.

use least_count_core::{DECK_SIZE, DEFAULT_CARDS_PER_PLAYER, MIN_PLAYERS};
use pico_args::Arguments;
use std::net::SocketAddr;
use thiserror::Error;

pub const HELP: &str = "\
Run a Least Count card table server

USAGE:
  least_count_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env LEAST_COUNT_BIND or 127.0.0.1:5555]
  --cards      N           Cards dealt to each player  [default: env LEAST_COUNT_CARDS_PER_PLAYER or 7]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  LEAST_COUNT_BIND               Server bind address
  LEAST_COUNT_CARDS_PER_PLAYER   Cards dealt to each player
  RUST_LOG                       Log filter, e.g. info or least_count_core=debug
";

const DEFAULT_BIND: &str = "127.0.0.1:5555";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub cards_per_player: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address {0:?}")]
    InvalidBind(String),
    #[error("invalid card count {0:?}")]
    InvalidCards(String),
    #[error("cards per player must be between 1 and {max}, got {got}")]
    CardsOutOfRange { got: usize, max: usize },
    #[error(transparent)]
    Args(#[from] pico_args::Error),
}

impl ServerConfig {
    /// Largest hand that still seats the minimum number of players plus the opening discard.
    pub fn max_cards_per_player() -> usize {
        (DECK_SIZE - 1) / MIN_PLAYERS
    }

    /// CLI flags win over environment variables, which win over defaults.
    pub fn from_args(pargs: &mut Arguments) -> Result<Self, ConfigError> {
        let bind = match pargs.opt_value_from_str::<_, String>("--bind")? {
            Some(bind) => bind,
            None => std::env::var("LEAST_COUNT_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
        };
        let cards = match pargs.opt_value_from_str::<_, String>("--cards")? {
            Some(cards) => Some(cards),
            None => std::env::var("LEAST_COUNT_CARDS_PER_PLAYER").ok(),
        };
        Self::parse(&bind, cards.as_deref())
    }

    fn parse(bind: &str, cards: Option<&str>) -> Result<Self, ConfigError> {
        let bind = bind.parse().map_err(|_| ConfigError::InvalidBind(bind.to_string()))?;
        let cards_per_player = match cards {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidCards(raw.to_string()))?,
            None => DEFAULT_CARDS_PER_PLAYER,
        };

        let max = Self::max_cards_per_player();
        if cards_per_player == 0 || cards_per_player > max {
            return Err(ConfigError::CardsOutOfRange { got: cards_per_player, max });
        }
        Ok(ServerConfig { bind, cards_per_player })
    }
}
