//! Tests for outbound fragmentation.

use std::num::NonZeroUsize;

use rstest::rstest;

use crate::{
    assembler::{BufferLimits, Ingest, SessionId, StreamAssembler, StreamKey},
    correlation::{CorrelatableFrame, CorrelationId},
    fragment::{FragmentSet, Fragmenter},
    frame::Frame,
};

fn fragmenter(chunk_size: usize) -> Fragmenter {
    Fragmenter::new(NonZeroUsize::new(chunk_size).expect("non-zero"))
}

fn chunks(set: &FragmentSet) -> Vec<&str> { set.fragments().iter().map(Frame::chunk).collect() }

#[test]
fn slices_payload_text_into_bounded_pieces() {
    let set = fragmenter(4)
        .split_text("img,ABCDEFGHIJ", None)
        .expect("split text");

    assert_eq!(chunks(&set), ["img,", "ABCD", "EFGH", "IJ"]);
    for (position, fragment) in set.fragments().iter().enumerate() {
        assert_eq!(fragment.index(), Some(u32::try_from(position).expect("small index")));
        assert_eq!(fragment.num_chunks(), Some(4));
    }
    assert_eq!(set.join_text(), "img,ABCDEFGHIJ");
}

#[test]
fn format_tag_is_prefixed_to_the_first_fragment_only() {
    let set = fragmenter(6).split("img", &[0, 16, 131, 16, 81], None).expect("split");
    assert_eq!(chunks(&set), ["img,AB", "CDEFE="]);
}

#[rstest]
#[case(CorrelationId::new("req-1"))]
#[case(CorrelationId::image_index(3))]
fn correlation_id_is_echoed_on_every_fragment(#[case] id: CorrelationId) {
    let set = fragmenter(2)
        .split("img", b"some bytes", Some(id.clone()))
        .expect("split");
    assert!(set.len() > 1);
    assert_eq!(set.correlation_id(), Some(&id));
    assert!(
        set.fragments()
            .iter()
            .all(|fragment| fragment.correlation_id().as_ref() == Some(&id))
    );
}

#[test]
fn empty_body_still_produces_one_fragment() {
    let set = fragmenter(16).split("img", &[], None).expect("split");
    assert_eq!(chunks(&set), ["img,"]);
    assert_eq!(set.fragments()[0].num_chunks(), Some(1));
}

#[test]
fn empty_text_produces_a_single_empty_fragment() {
    let set = fragmenter(3).split_text("", None).expect("split text");
    assert_eq!(chunks(&set), [""]);
}

#[test]
fn multibyte_characters_are_never_split() {
    let set = fragmenter(2).split_text("é🙂,AB", None).expect("split text");
    assert_eq!(chunks(&set), ["é🙂", ",A", "B"]);
}

#[test]
fn fragments_reassemble_to_the_original_payload() {
    let body: Vec<u8> = (0..=255).collect();
    let set = fragmenter(7).split("image/jpeg", &body, None).expect("split");

    let session = SessionId::new(1);
    let key = StreamKey::new(session, "out");
    let mut assembler = StreamAssembler::new(session, BufferLimits::default());
    let mut completed = None;
    for fragment in set {
        if let Ingest::Complete(done) = assembler.ingest(key.clone(), fragment).expect("ingest") {
            completed = Some(done);
        }
    }

    let done = completed.expect("fragments complete the stream");
    assert_eq!(done.payload().format_tag(), "image/jpeg");
    assert_eq!(done.payload().body(), body.as_slice());
}
