//! Cross-matching of back and lay queues
//!
//! Runs on demand over the two book heads. A cross happens whenever the
//! best back's odds do not exceed the best lay's odds, and always executes
//! at the resting back's quoted price. Stakes are related through the
//! integer-truncating conversions on `Odds`; whatever the truncation
//! leaves over stays with the exchange.

use std::collections::HashMap;
use tracing::{debug, trace};
use types::bet::{Bet, MatchFill};
use types::ids::BetId;

use crate::book::{BackQueue, LayQueue};

/// Run the matching loop until the book no longer crosses
///
/// Returns the number of fills executed. Heads that are no longer live
/// (zero remainder or terminal status) are dropped from the queues as they
/// are encountered.
pub fn cross(
    backs: &mut BackQueue,
    lays: &mut LayQueue,
    bets: &mut HashMap<BetId, Bet>,
) -> usize {
    let mut fills = 0;

    loop {
        let back_id = match backs.head() {
            Some(entry) => entry.bet.clone(),
            None => break,
        };
        let back = bets
            .get(&back_id)
            .expect("book entry without a bet record");
        if !back.is_bookable() {
            backs.pop_head();
            continue;
        }

        let lay_id = match lays.head() {
            Some(entry) => entry.bet.clone(),
            None => break,
        };
        let lay = bets.get(&lay_id).expect("book entry without a bet record");
        if !lay.is_bookable() {
            lays.pop_head();
            continue;
        }

        // No cross once the cheapest back asks for more than the most
        // generous lay offers.
        if back.odds > lay.odds {
            break;
        }

        // Cross at the resting back's quoted odds.
        let odds = back.odds;
        let back_remaining = back.remaining_stake;
        let lay_need = lay.remaining_stake;
        let capacity = odds.liability_on(back_remaining);

        let (back_stake, lay_liability) = if capacity >= lay_need {
            // The back absorbs the whole lay.
            (odds.backer_stake_for(lay_need), lay_need)
        } else {
            // The lay absorbs the whole back.
            (back_remaining, capacity)
        };

        trace!(
            back = %back_id,
            lay = %lay_id,
            %odds,
            back_stake = %back_stake,
            lay_liability = %lay_liability,
            "crossed"
        );

        bets.get_mut(&back_id)
            .expect("back record vanished mid-match")
            .apply_fill(MatchFill {
                counterparty: lay_id.clone(),
                back_stake,
                lay_liability,
                odds,
            });
        bets.get_mut(&lay_id)
            .expect("lay record vanished mid-match")
            .apply_fill(MatchFill {
                counterparty: back_id.clone(),
                back_stake,
                lay_liability,
                odds,
            });

        if capacity >= lay_need {
            lays.pop_head();
        } else {
            backs.pop_head();
        }

        fills += 1;
    }

    if fills > 0 {
        debug!(fills, "matching pass complete");
    }
    fills
}
