//! Settlement arithmetic
//!
//! Computes what a bet is owed when its market resolves. All amounts come
//! out of the stakes the bet itself committed plus, for winners, the
//! counterparty stakes recorded in its fills, so the ledger credit per bet
//! never needs another record.

use types::bet::{Bet, BetSide};
use types::numeric::Amount;

/// Amount to credit a bet's owner when the market settles with `outcome`
///
/// The unmatched remainder always comes back 1:1. On top of that a winning
/// back collects the truncated gross return on each matched portion, and a
/// winning lay collects each absorbed backer stake plus its own committed
/// liability. Losers get nothing beyond the remainder; the matched stakes
/// went to the other side.
pub fn payout(bet: &Bet, outcome: bool) -> Amount {
    let remainder = bet.remaining_stake;

    let winnings: Amount = match (bet.side, outcome) {
        (BetSide::Back, true) => bet
            .matched
            .iter()
            .map(|fill| fill.odds.gross_return(fill.back_stake))
            .sum(),
        (BetSide::Lay, false) => bet
            .matched
            .iter()
            .map(|fill| fill.back_stake + fill.lay_liability)
            .sum(),
        _ => Amount::ZERO,
    };

    remainder + winnings
}

/// Amount to return when a bet is refunded in whole (market cancellation)
///
/// Everything the bet still holds in custody: the unmatched remainder plus
/// this side's committed stake across all fills. Equals the original stake
/// unless part of the bet was already cancelled and returned.
pub fn whole_refund(bet: &Bet) -> Amount {
    bet.remaining_stake + bet.matched_stake()
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::bet::MatchFill;
    use types::ids::{BetId, MarketId, UserId};
    use types::numeric::Odds;

    fn bet_id(user: &str, counter: u64) -> BetId {
        BetId::new(UserId::new(user), MarketId::new("m1"), counter)
    }

    fn matched_pair() -> (Bet, Bet) {
        // back 1000@1.50 fully crossed with lay 500@1.50
        let mut back = Bet::new(
            bet_id("u1", 1),
            BetSide::Back,
            Odds::new(150),
            Amount::new(1000),
        );
        let mut lay = Bet::new(
            bet_id("u2", 2),
            BetSide::Lay,
            Odds::new(150),
            Amount::new(500),
        );
        let fill = MatchFill {
            counterparty: lay.id.clone(),
            back_stake: Amount::new(1000),
            lay_liability: Amount::new(500),
            odds: Odds::new(150),
        };
        back.apply_fill(fill.clone());
        lay.apply_fill(MatchFill {
            counterparty: back.id.clone(),
            ..fill
        });
        (back, lay)
    }

    #[test]
    fn test_winning_back_collects_gross_return() {
        let (back, _) = matched_pair();
        assert_eq!(payout(&back, true), Amount::new(1500));
    }

    #[test]
    fn test_losing_back_gets_nothing_matched() {
        let (back, _) = matched_pair();
        assert_eq!(payout(&back, false), Amount::ZERO);
    }

    #[test]
    fn test_winning_lay_collects_stake_and_liability() {
        let (_, lay) = matched_pair();
        assert_eq!(payout(&lay, false), Amount::new(1500));
    }

    #[test]
    fn test_losing_lay_gets_nothing_matched() {
        let (_, lay) = matched_pair();
        assert_eq!(payout(&lay, true), Amount::ZERO);
    }

    #[test]
    fn test_unmatched_remainder_always_refunds() {
        let bet = Bet::new(
            bet_id("u1", 1),
            BetSide::Back,
            Odds::new(153),
            Amount::new(1000),
        );
        assert_eq!(payout(&bet, true), Amount::new(1000));
        assert_eq!(payout(&bet, false), Amount::new(1000));
    }

    #[test]
    fn test_partially_matched_back_mixes_refund_and_winnings() {
        let mut back = Bet::new(
            bet_id("u1", 1),
            BetSide::Back,
            Odds::new(150),
            Amount::new(1000),
        );
        back.apply_fill(MatchFill {
            counterparty: bet_id("u2", 2),
            back_stake: Amount::new(400),
            lay_liability: Amount::new(200),
            odds: Odds::new(150),
        });

        // 600 remainder + floor(400 * 1.5) = 600 + 600
        assert_eq!(payout(&back, true), Amount::new(1200));
        // losing: remainder only
        assert_eq!(payout(&back, false), Amount::new(600));
    }

    #[test]
    fn test_per_portion_truncation() {
        // Two small portions at 1.51: floor(3*1.51) + floor(3*1.51) = 4+4,
        // one unit short of the untruncated 9.06.
        let mut back = Bet::new(
            bet_id("u1", 1),
            BetSide::Back,
            Odds::new(151),
            Amount::new(6),
        );
        for counter in [2, 3] {
            back.apply_fill(MatchFill {
                counterparty: bet_id("u2", counter),
                back_stake: Amount::new(3),
                lay_liability: Amount::new(1),
                odds: Odds::new(151),
            });
        }
        assert_eq!(payout(&back, true), Amount::new(8));
    }

    #[test]
    fn test_whole_refund_covers_matched_and_remainder() {
        let (back, lay) = matched_pair();
        assert_eq!(whole_refund(&back), Amount::new(1000));
        assert_eq!(whole_refund(&lay), Amount::new(500));

        let mut partial = Bet::new(
            bet_id("u3", 9),
            BetSide::Back,
            Odds::new(150),
            Amount::new(1000),
        );
        partial.apply_fill(MatchFill {
            counterparty: bet_id("u2", 2),
            back_stake: Amount::new(400),
            lay_liability: Amount::new(200),
            odds: Odds::new(150),
        });
        assert_eq!(whole_refund(&partial), Amount::new(1000));
    }
}
