//! Which rows of a block are shown.
//!
//! Content rows stand on their own. Headings and section sums cascade: they
//! appear only when a row in their own section does, and a section ends at
//! the next heading or subtotal in either direction.

use crate::aggregate::{closing_value, is_book_value_row};
use crate::kinds::KindSpec;
use crate::models::{NoteLineItem, Period};
use crate::resolver::ValueResolver;

/// The book-value row is judged by the computed total it displays, every
/// other row by its resolved value.
fn has_amount(spec: &KindSpec, item: &NoteLineItem, resolver: &ValueResolver<'_>) -> bool {
    if is_book_value_row(spec, item) {
        return Period::ALL
            .iter()
            .any(|period| closing_value(spec, resolver, *period).total != 0);
    }
    Period::ALL
        .iter()
        .any(|period| resolver.resolve_row(item, *period) != 0)
}

/// Non-zero in either period, or opted in by the block's "show all" toggle.
fn amount_or_toggle(spec: &KindSpec, item: &NoteLineItem, resolver: &ValueResolver<'_>, toggle_on: bool) -> bool {
    has_amount(spec, item, resolver) || (item.toggle_show && toggle_on)
}

pub fn content_visible(spec: &KindSpec, item: &NoteLineItem, resolver: &ValueResolver<'_>, toggle_on: bool) -> bool {
    item.always_show == Some(true) || amount_or_toggle(spec, item, resolver, toggle_on)
}

/// Rows pinned with `always_show` don't count: a pinned row must not drag
/// an otherwise empty section onto the page.
fn is_visible_trigger(spec: &KindSpec, item: &NoteLineItem, resolver: &ValueResolver<'_>, toggle_on: bool) -> bool {
    item.style.is_content()
        && item.always_show != Some(true)
        && amount_or_toggle(spec, item, resolver, toggle_on)
}

fn heading_visible(spec: &KindSpec, index: usize, resolver: &ValueResolver<'_>, toggle_on: bool) -> bool {
    let items = resolver.items();
    if content_visible(spec, &items[index], resolver, toggle_on) {
        return true;
    }
    items[index + 1..]
        .iter()
        .take_while(|item| !item.style.is_boundary())
        .any(|item| is_visible_trigger(spec, item, resolver, toggle_on))
}

fn section_sum_visible(spec: &KindSpec, index: usize, resolver: &ValueResolver<'_>, toggle_on: bool) -> bool {
    let items = resolver.items();
    items[..index]
        .iter()
        .rev()
        .take_while(|item| !item.style.is_boundary())
        .any(|item| is_visible_trigger(spec, item, resolver, toggle_on))
}

pub fn row_visible(spec: &KindSpec, index: usize, resolver: &ValueResolver<'_>, toggle_on: bool) -> bool {
    let item = &resolver.items()[index];
    if item.style.is_heading() {
        heading_visible(spec, index, resolver, toggle_on)
    } else if item.style.is_section_sum() {
        section_sum_visible(spec, index, resolver, toggle_on)
    } else {
        content_visible(spec, item, resolver, toggle_on)
    }
}

/// Indices of the visible rows, in row order.
pub fn visible_indices(spec: &KindSpec, resolver: &ValueResolver<'_>, toggle_on: bool) -> Vec<usize> {
    (0..resolver.items().len())
        .filter(|&i| row_visible(spec, i, resolver, toggle_on))
        .collect()
}
