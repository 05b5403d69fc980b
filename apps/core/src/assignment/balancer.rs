//! Pure handler selection.

use std::cmp::Ordering;

use super::Handler;
use crate::models::Category;

/// Compares `a.current_load / a.max_load` with `b`'s exactly, without floats.
fn load_ratio_cmp(a: &Handler, b: &Handler) -> Ordering {
    let lhs = u64::from(a.current_load) * u64::from(b.max_load);
    let rhs = u64::from(b.current_load) * u64::from(a.max_load);
    lhs.cmp(&rhs)
}

/// Picks the handler a new `category` ticket should go to.
///
/// Among handlers skilled in `category` with spare capacity, the lowest load ratio wins.
/// If nobody qualifies, the handler with the lowest absolute load across the whole roster
/// is used even if that takes them past their maximum. Ties break on id. Returns `None`
/// only for an empty roster.
pub fn select_handler<'a>(roster: &'a [Handler], category: Category) -> Option<&'a Handler> {
    let skilled = roster
        .iter()
        .filter(|h| h.handles(category) && h.has_capacity())
        .min_by(|a, b| load_ratio_cmp(a, b).then_with(|| a.id.cmp(&b.id)));

    skilled.or_else(|| {
        roster
            .iter()
            .min_by(|a, b| a.current_load.cmp(&b.current_load).then_with(|| a.id.cmp(&b.id)))
    })
}
