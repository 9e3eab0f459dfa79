//! Snapshot state layout
//!
//! The value stored under an exchange name. `BTreeMap` keeps user
//! iteration deterministic so identical states always serialize to
//! identical bytes, which the checksum relies on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::bet::Bet;
use types::ids::BetId;
use types::market::MarketInfo;
use types::numeric::Amount;

/// Full exchange state as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    /// User accounts keyed by user id string.
    pub users: BTreeMap<String, UserSnapshot>,
    /// Exchange-wide bet counter, as last allocated.
    pub counter: u64,
    /// Markets in creation order; restart replays them in list order.
    pub markets: Vec<MarketSnapshot>,
}

impl ExchangeSnapshot {
    pub fn empty() -> Self {
        Self {
            users: BTreeMap::new(),
            counter: 0,
            markets: Vec::new(),
        }
    }
}

/// One user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub name: String,
    pub balance: Amount,
    /// Bet ids newest first, as `user_bets` lists them.
    pub bets: Vec<BetId>,
}

/// One market with every bet it has ever recorded
///
/// Each side lists its bets in placement order, matched and terminal ones
/// included: settlement state has to survive a restart, and the book is
/// rebuilt from the live subset on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub info: MarketInfo,
    pub backs: Vec<Bet>,
    pub lays: Vec<Bet>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::bet::{BetSide, BetStatus};
    use types::ids::{MarketId, UserId};
    use types::market::MarketStatus;
    use types::numeric::Odds;

    fn sample() -> ExchangeSnapshot {
        let mut users = BTreeMap::new();
        let bet_id = BetId::new(UserId::new("alice"), MarketId::new("derby"), 1);
        users.insert(
            "alice".to_string(),
            UserSnapshot {
                name: "Alice".to_string(),
                balance: Amount::new(1000),
                bets: vec![bet_id.clone()],
            },
        );

        let mut bet = Bet::new(bet_id, BetSide::Back, Odds::new(150), Amount::new(1000));
        bet.status = BetStatus::Active;

        ExchangeSnapshot {
            users,
            counter: 2,
            markets: vec![MarketSnapshot {
                info: MarketInfo::new(MarketId::new("derby"), "the derby"),
                backs: vec![bet],
                lays: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_bincode_round_trip() {
        let snapshot = sample();
        let bytes = bincode::serialize(&snapshot).unwrap();
        let decoded: ExchangeSnapshot = bincode::deserialize(&bytes).unwrap();
        assert_eq!(snapshot, decoded);
        assert_eq!(decoded.markets[0].info.status, MarketStatus::Active);
    }

    #[test]
    fn test_deterministic_bytes_regardless_of_insert_order() {
        let mut a = ExchangeSnapshot::empty();
        let mut b = ExchangeSnapshot::empty();
        for key in ["zoe", "amy"] {
            a.users.insert(
                key.to_string(),
                UserSnapshot {
                    name: key.to_string(),
                    balance: Amount::ZERO,
                    bets: Vec::new(),
                },
            );
        }
        for key in ["amy", "zoe"] {
            b.users.insert(
                key.to_string(),
                UserSnapshot {
                    name: key.to_string(),
                    balance: Amount::ZERO,
                    bets: Vec::new(),
                },
            );
        }
        assert_eq!(
            bincode::serialize(&a).unwrap(),
            bincode::serialize(&b).unwrap()
        );
    }
}
