//! Splits payload text into index-annotated frames.

use std::num::NonZeroUsize;

use super::FragmentationError;
use crate::{correlation::CorrelationId, frame::Frame, payload::encode_text};

/// Splits outbound payloads into fragment-sized frames.
#[derive(Clone, Copy, Debug)]
pub struct Fragmenter {
    chunk_size: NonZeroUsize,
}

impl Fragmenter {
    /// Create a fragmenter that caps each fragment at `chunk_size` characters.
    #[must_use]
    pub const fn new(chunk_size: NonZeroUsize) -> Self { Self { chunk_size } }

    /// Return the maximum fragment size in characters.
    #[must_use]
    pub const fn chunk_size(&self) -> NonZeroUsize { self.chunk_size }

    /// Encode `body`, prefix it with `format_tag` and the delimiter, and split
    /// the result into fragments carrying `correlation_id`.
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use chunkframe::fragment::Fragmenter;
    ///
    /// let fragmenter = Fragmenter::new(NonZeroUsize::new(4).expect("non-zero"));
    /// let set = fragmenter.split("img", b"hi", None).expect("split");
    /// assert_eq!(set.join_text(), "img,aGk=");
    /// assert_eq!(set.len(), 2);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::TooManyFragments`] if the fragment count
    /// does not fit in a `u32`.
    pub fn split(
        &self,
        format_tag: &str,
        body: &[u8],
        correlation_id: Option<CorrelationId>,
    ) -> Result<FragmentSet, FragmentationError> {
        self.split_text(&encode_text(format_tag, body), correlation_id)
    }

    /// Split already-encoded payload text into fragments.
    ///
    /// Pieces hold at most `chunk_size` characters and never split a
    /// character. Empty text yields a single empty fragment.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::TooManyFragments`] if the fragment count
    /// does not fit in a `u32`.
    pub fn split_text(
        &self,
        text: &str,
        correlation_id: Option<CorrelationId>,
    ) -> Result<FragmentSet, FragmentationError> {
        let pieces = self.pieces(text);
        let total = u32::try_from(pieces.len()).map_err(|_| {
            FragmentationError::TooManyFragments {
                count: pieces.len(),
            }
        })?;
        let fragments = (0..total)
            .zip(pieces)
            .map(|(index, piece)| {
                Frame::new(piece)
                    .with_index(index)
                    .with_num_chunks(total)
                    .with_correlation_id(correlation_id.clone())
            })
            .collect();
        Ok(FragmentSet {
            correlation_id,
            fragments,
        })
    }

    fn pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let max = self.chunk_size.get();
        let mut pieces = Vec::with_capacity(text.len().div_ceil(max));
        let mut start = 0;
        let mut count = 0;
        for (offset, _) in text.char_indices() {
            if count == max {
                pieces.push(&text[start..offset]);
                start = offset;
                count = 0;
            }
            count += 1;
        }
        pieces.push(&text[start..]);
        pieces
    }
}

/// Ordered fragments produced for one payload.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSet {
    correlation_id: Option<CorrelationId>,
    fragments: Vec<Frame>,
}

impl FragmentSet {
    /// Correlation id copied onto every fragment.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&CorrelationId> { self.correlation_id.as_ref() }

    /// Return the fragments as a slice, in index order.
    #[must_use]
    pub fn fragments(&self) -> &[Frame] { self.fragments.as_slice() }

    /// Number of fragments in the set.
    #[expect(
        clippy::len_without_is_empty,
        reason = "fragment sets are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.fragments.len() }

    /// Concatenate the fragment chunks in index order.
    #[must_use]
    pub fn join_text(&self) -> String { self.fragments.iter().map(Frame::chunk).collect() }

    /// Consume the set, returning all fragments.
    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> { self.fragments }
}

impl IntoIterator for FragmentSet {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter { self.fragments.into_iter() }
}
