//! "Exactly one" selection over candidate lists.

use crate::error::{GalaxyError, Result};

/// Return the only item of `items`.
///
/// The iterator is always consumed to the end so the reported count is the
/// real number of candidates. `what` describes the selection for the error.
pub fn select_one<I>(items: I, what: &str) -> Result<I::Item>
where
    I: IntoIterator,
{
    let mut items = items.into_iter();
    let first = items.next();
    let rest = items.count();
    match (first, rest) {
        (Some(item), 0) => Ok(item),
        (first, rest) => Err(GalaxyError::AmbiguousSelection {
            what: what.to_string(),
            count: usize::from(first.is_some()) + rest,
        }),
    }
}

/// Like [`select_one`], for callers with nothing better to say than "item".
pub fn get_one<I>(items: I) -> Result<I::Item>
where
    I: IntoIterator,
{
    select_one(items, "item")
}
