//! Order book for a single market
//!
//! Two odds-ordered queues of bet ids: backs ascending (the cheapest back
//! is the easiest to cover) and lays descending (the most generous lay is
//! the easiest to take). Ties are broken by insertion time on both sides.

pub mod back_queue;
pub mod lay_queue;

pub use back_queue::BackQueue;
pub use lay_queue::LayQueue;

use types::ids::BetId;
use types::numeric::Odds;

/// One resting bet in a book queue
///
/// The odds are duplicated from the bet record so ordering decisions never
/// require a record lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct BookEntry {
    pub odds: Odds,
    pub bet: BetId,
}
