//! Builders for inbound chunk frames.

use chunkframe::Frame;

/// Split `text` into pieces of at most `size` characters.
///
/// Empty text yields no pieces.
///
/// # Panics
///
/// Panics if `size` is zero.
#[must_use]
pub fn split_text(text: &str, size: usize) -> Vec<String> {
    assert!(size > 0, "chunk size must be non-zero");
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Frames for `text` in arrival mode: only the first carries `numChunks`.
///
/// # Panics
///
/// Panics if `size` is zero or the piece count exceeds `u32::MAX`.
#[must_use]
pub fn arrival_frames(text: &str, size: usize) -> Vec<Frame> {
    let pieces = split_text(text, size);
    let total = u32::try_from(pieces.len()).expect("piece count fits in u32");
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let frame = Frame::new(piece);
            if i == 0 { frame.with_num_chunks(total) } else { frame }
        })
        .collect()
}

/// Frames for `text` in indexed mode, every frame carrying its index and the
/// total count.
///
/// # Panics
///
/// Panics if `size` is zero or the piece count exceeds `u32::MAX`.
#[must_use]
pub fn indexed_frames(text: &str, size: usize) -> Vec<Frame> {
    let pieces = split_text(text, size);
    let total = u32::try_from(pieces.len()).expect("piece count fits in u32");
    pieces
        .into_iter()
        .zip(0..)
        .map(|(piece, index)| Frame::new(piece).with_index(index).with_num_chunks(total))
        .collect()
}

/// Join outbound fragments by index, checking they form one complete set.
///
/// # Panics
///
/// Panics if the fragments disagree on their count, an index is missing or
/// repeated, or a fragment lacks metadata.
#[must_use]
pub fn join_fragments(fragments: &[Frame]) -> String {
    let total = fragments
        .first()
        .and_then(Frame::num_chunks)
        .expect("fragment carries numChunks");
    assert_eq!(
        usize::try_from(total).expect("count fits in usize"),
        fragments.len(),
        "fragment count mismatch"
    );
    let mut ordered: Vec<&Frame> = fragments.iter().collect();
    ordered.sort_by_key(|f| f.index().expect("fragment carries index"));
    for (expected, frame) in (0..).zip(&ordered) {
        assert_eq!(frame.index(), Some(expected), "missing or repeated index");
        assert_eq!(frame.num_chunks(), Some(total), "inconsistent numChunks");
    }
    ordered.iter().map(|f| f.chunk()).collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("abcdefg", 3, &["abc", "def", "g"])]
    #[case("abc", 5, &["abc"])]
    #[case("", 2, &[])]
    fn split_text_respects_size(#[case] text: &str, #[case] size: usize, #[case] expected: &[&str]) {
        assert_eq!(split_text(text, size), expected);
    }

    #[test]
    fn arrival_frames_declare_count_once() {
        let frames = arrival_frames("img,aGk=", 3);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].num_chunks(), Some(3));
        assert!(frames[1..].iter().all(|f| f.num_chunks().is_none() && f.index().is_none()));
    }

    #[test]
    fn indexed_frames_round_trip_through_join() {
        let mut frames = indexed_frames("img,aGVsbG8=", 4);
        frames.reverse();
        assert_eq!(join_fragments(&frames), "img,aGVsbG8=");
    }
}
