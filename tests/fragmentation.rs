//! Property tests for fragmentation and reassembly.

use std::num::NonZeroUsize;

use chunkframe::{
    BufferLimits,
    Fragmenter,
    Ingest,
    ReconstructedPayload,
    SessionId,
    StreamAssembler,
    StreamKey,
};
use chunkframe_testing::{arrival_frames, join_fragments};
use proptest::prelude::*;

fn fragmenter(size: usize) -> Fragmenter { Fragmenter::new(NonZeroUsize::new(size).expect("non-zero")) }

proptest! {
    #[test]
    fn split_then_join_is_lossless(
        tag in "[a-z]{1,8}",
        body in proptest::collection::vec(any::<u8>(), 0..512),
        size in 1usize..64,
    ) {
        let set = fragmenter(size).split(&tag, &body, None).expect("split");
        let text = join_fragments(&set.into_frames());
        let payload = ReconstructedPayload::parse(&text).expect("parse");
        prop_assert_eq!(payload.format_tag(), tag.as_str());
        prop_assert_eq!(payload.body(), body.as_slice());
    }

    #[test]
    fn fragments_never_exceed_the_chunk_size(
        text in "\\PC{0,200}",
        size in 1usize..32,
    ) {
        let set = fragmenter(size).split_text(&text, None).expect("split");
        for frame in set.fragments() {
            prop_assert!(frame.chunk().chars().count() <= size);
        }
        prop_assert_eq!(set.join_text(), text);
    }

    #[test]
    fn assembler_completes_exactly_once(
        body in proptest::collection::vec(any::<u8>(), 0..256),
        size in 1usize..16,
    ) {
        let text = chunkframe::payload::encode_text("bin", &body);
        let frames = arrival_frames(&text, size);
        let last = frames.len() - 1;
        let mut assembler = StreamAssembler::new(SessionId::new(1), BufferLimits::default());
        let key = StreamKey::new(SessionId::new(1), "p");

        for (i, frame) in frames.into_iter().enumerate() {
            let outcome = assembler.ingest(key.clone(), frame).expect("ingest");
            if i == last {
                let Ingest::Complete(done) = outcome else {
                    return Err(TestCaseError::fail("final chunk did not complete"));
                };
                prop_assert_eq!(done.payload().body(), body.as_slice());
            } else {
                prop_assert_eq!(outcome, Ingest::Pending);
            }
        }
        prop_assert_eq!(assembler.buffered_len(), 0);
    }
}
