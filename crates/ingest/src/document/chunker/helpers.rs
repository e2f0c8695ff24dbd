//! Boundary detection and cut selection used by the chunking strategy.

use super::types::CutKind;

/// Closing punctuation allowed between a sentence terminal and the space.
const CLOSERS: &[u8] = b"\"')]";

/// Byte offsets where a new sentence starts: right after a `.`, `!` or `?`
/// (optionally followed by closing quotes or brackets) and a single space.
///
/// Expects normalized text, where every whitespace run is one ASCII space.
pub(crate) fn sentence_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut starts = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?') {
            let mut j = i + 1;
            while j < bytes.len() && CLOSERS.contains(&bytes[j]) {
                j += 1;
            }
            if j + 1 < bytes.len() && bytes[j] == b' ' {
                starts.push(j + 1);
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    starts
}

/// Byte index `n` characters after `from`, clamped to the text length.
pub(crate) fn advance_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(i, _)| from + i)
}

/// Byte index `n` characters before `from`, clamped to 0.
pub(crate) fn retreat_chars(text: &str, from: usize, n: usize) -> usize {
    if n == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map_or(0, |(i, _)| i)
}

/// Choose where a chunk whose new text starts at `own_start` should end,
/// given a target end `target` (a char boundary before the end of `text`).
///
/// Prefers the last sentence start within `lookback` characters of the
/// target, then the last word break, then a hard cut at the target. The
/// result is always a char boundary strictly greater than `own_start`.
pub(crate) fn find_cut(
    text: &str,
    sentence_starts: &[usize],
    own_start: usize,
    target: usize,
    lookback: usize,
) -> (usize, CutKind) {
    let first_allowed = advance_chars(text, own_start, 1);
    let floor = retreat_chars(text, target, lookback).max(first_allowed);

    let idx = sentence_starts.partition_point(|&s| s <= target);
    if idx > 0 && sentence_starts[idx - 1] >= floor {
        return (sentence_starts[idx - 1], CutKind::Sentence);
    }

    if floor < target {
        if let Some(pos) = text[floor..target].rfind(' ') {
            return (floor + pos + 1, CutKind::Word);
        }
    }

    (target.max(first_allowed), CutKind::Hard)
}

/// Where the next chunk's window starts: at most `overlap` characters
/// before `end`, never before `window_start`, nudged forward to the next
/// word start. Returns `end` when no overlap is wanted.
pub(crate) fn overlap_start(text: &str, window_start: usize, end: usize, overlap: usize) -> usize {
    if overlap == 0 {
        return end;
    }
    let candidate = retreat_chars(text, end, overlap).max(window_start);
    if candidate >= end || candidate == 0 || text.as_bytes()[candidate - 1] == b' ' {
        return candidate;
    }
    match text[candidate..end].find(' ') {
        Some(pos) if candidate + pos + 1 < end => candidate + pos + 1,
        _ => candidate,
    }
}

/// Sentences represented in `text[start..end]`: the boundaries strictly
/// inside the range, plus the one the range starts in.
pub(crate) fn count_sentences(sentence_starts: &[usize], start: usize, end: usize) -> usize {
    let lo = sentence_starts.partition_point(|&s| s <= start);
    let hi = sentence_starts.partition_point(|&s| s < end);
    hi.saturating_sub(lo) + 1
}
