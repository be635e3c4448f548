//! Column widths.
//!
//! A fixed column keeps its declared width. An auto column is as wide as the
//! widest entry it has ever held (header label, row text, summary text),
//! clamped to its `min`/`max`. Auto widths only grow: a row that gets
//! shorter does not pull its column in and force a repaint.
//!
//! When the table has a maximum total width, auto columns are narrowed one
//! column at a time, widest first, until the table fits or every auto
//! column has reached its floor.

use termtab_style::Resolved;
use termtab_term::width::display_width;

/// Fitted width of every column before any total-width limit.
///
/// `entries` yields, per line, the texts that must fit. `seen` holds the
/// widths fitted last time (empty on the first call).
#[must_use]
pub fn fit<'a, I>(styles: &[Resolved], entries: I, seen: &[usize]) -> Vec<usize>
where
    I: IntoIterator<Item = Vec<&'a str>>,
{
    let mut natural: Vec<usize> = (0..styles.len())
        .map(|i| seen.get(i).copied().unwrap_or(0))
        .collect();
    for texts in entries {
        for (w, text) in natural.iter_mut().zip(texts) {
            *w = (*w).max(display_width(text));
        }
    }
    styles
        .iter()
        .zip(&natural)
        .map(|(s, &n)| s.width.fit(n))
        .collect()
}

/// Total display width of a line with these column widths.
#[must_use]
pub fn total(widths: &[usize], separator: usize) -> usize {
    widths.iter().sum::<usize>() + separator * widths.len().saturating_sub(1)
}

/// Narrow auto columns until the line is at most `limit` wide.
pub fn shrink(widths: &mut [usize], styles: &[Resolved], separator: usize, limit: usize) {
    let mut excess = total(widths, separator).saturating_sub(limit);
    while excess > 0 {
        let widest = widths
            .iter()
            .zip(styles)
            .enumerate()
            .filter(|&(_, (&w, s))| s.width.is_auto() && w > s.width.floor())
            .max_by_key(|&(i, (&w, _))| (w, std::cmp::Reverse(i)))
            .map(|(i, _)| i);
        let Some(i) = widest else { break };
        widths[i] -= 1;
        excess -= 1;
    }
}
