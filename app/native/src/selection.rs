//! Entry selection.
//!
//! Sequential playlists walk a cursor; shuffled playlists pick uniformly at
//! random and leave the cursor alone.

use rand::Rng;

use crate::playlist::{Entry, Playlist};

/// One picked entry and the cursor to persist afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    /// Index of the entry within the playlist.
    pub index: usize,
    /// The entry itself.
    pub entry: &'a Entry,
    /// Cursor to store once the fire completes.
    pub next_cursor: usize,
}

/// Picks the next entry of `playlist`.
///
/// Returns `None` when the playlist has no entries.
pub fn next<'a, R: Rng + ?Sized>(playlist: &'a Playlist, rng: &mut R) -> Option<Selection<'a>> {
    pick(&playlist.entries, playlist.current_index, playlist.shuffle, rng)
}

/// Picks `count` entries in a row, threading the cursor between picks.
///
/// Used when every monitor gets its own entry. Returns an empty list when the
/// playlist has no entries; the last selection carries the cursor to persist.
pub fn next_many<'a, R: Rng + ?Sized>(
    playlist: &'a Playlist,
    count: usize,
    rng: &mut R,
) -> Vec<Selection<'a>> {
    let mut selections = Vec::with_capacity(count);
    let mut cursor = playlist.current_index;

    for _ in 0..count {
        let Some(selection) = pick(&playlist.entries, cursor, playlist.shuffle, rng) else {
            break;
        };
        cursor = selection.next_cursor;
        selections.push(selection);
    }

    selections
}

fn pick<'a, R: Rng + ?Sized>(
    entries: &'a [Entry],
    cursor: usize,
    shuffle: bool,
    rng: &mut R,
) -> Option<Selection<'a>> {
    if entries.is_empty() {
        return None;
    }

    let len = entries.len();
    let (index, next_cursor) = if shuffle {
        (rng.random_range(0..len), cursor)
    } else {
        // A stale cursor (entries removed since the last fire) wraps around.
        let index = cursor % len;
        (index, (index + 1) % len)
    };

    Some(Selection {
        index,
        entry: &entries[index],
        next_cursor,
    })
}
