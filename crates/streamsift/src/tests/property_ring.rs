use quickcheck::QuickCheck;

use crate::RingBuffer;

/// Property: whatever the write and read chunking, the bytes read back are
/// exactly the bytes written, in order, across growth and wraparound.
#[test]
fn ring_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(initial: u8, writes: Vec<Vec<u8>>, reads: Vec<usize>) -> bool {
        let ring = RingBuffer::new(usize::from(initial % 16));
        let mut expected = Vec::new();
        let mut got = Vec::new();
        let mut capacity = ring.capacity();
        let mut reads = reads.into_iter().cycle();

        for chunk in &writes {
            assert_eq!(ring.write(chunk).unwrap(), chunk.len());
            expected.extend_from_slice(chunk);

            let mut dst = vec![0; reads.next().unwrap_or(1) % 32];
            let n = ring.read(&mut dst).unwrap();
            got.extend_from_slice(&dst[..n]);

            if ring.capacity() < capacity || ring.len() > ring.capacity() {
                return false;
            }
            capacity = ring.capacity();
        }

        ring.close();
        let mut dst = [0u8; 7];
        while let Ok(n) = ring.read(&mut dst) {
            got.extend_from_slice(&dst[..n]);
        }
        got == expected && ring.is_empty()
    }

    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;

    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(u8, Vec<Vec<u8>>, Vec<usize>) -> bool);
}

/// Property: peeking never consumes, and consume never over-reads.
#[test]
fn peek_consume_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(data: Vec<u8>, steps: Vec<(u8, u8)>) -> bool {
        let ring = RingBuffer::new(8);
        ring.write(&data).unwrap();
        let mut offset = 0;
        for (peek, consume) in steps {
            let mut dst = vec![0; usize::from(peek)];
            let n = ring.peek(&mut dst).unwrap();
            if dst[..n] != data[offset..offset + n] {
                return false;
            }
            let consumed = ring.consume(usize::from(consume));
            if consumed != usize::from(consume).min(data.len() - offset) {
                return false;
            }
            offset += consumed;
        }
        ring.len() == data.len() - offset
    }

    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;

    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(Vec<u8>, Vec<(u8, u8)>) -> bool);
}
