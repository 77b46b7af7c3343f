#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};
use streamsift::{Chain, RingBuffer, Scanner, ScannerOptions, json_split};

#[derive(Debug, Arbitrary)]
struct Input {
    chunks: Vec<Vec<u8>>,
    initial_buffer_size: u8,
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

fn check(all: &[u8], token: &[u8], chain: &Chain) {
    assert!(token.first() == Some(&b'{') && token.last() == Some(&b'}'), "token {token:?}");
    // Anything not cut from the input was produced by wrapping and must be
    // a JSON object.
    if !contains(all, token) {
        serde_json::from_slice::<Map<String, Value>>(token).expect("wrapped text is a JSON object");
    }
    let _ = chain.run(token);
}

fuzz_target!(|input: Input| {
    let all = input.chunks.concat();
    let ring = RingBuffer::new(16);
    let options = ScannerOptions {
        initial_buffer_size: usize::from(input.initial_buffer_size).max(1),
        ..Default::default()
    };
    let mut scanner = Scanner::with_options(&ring, json_split, options);
    let chain = Chain::json();

    for chunk in &input.chunks {
        ring.write(chunk).expect("ring accepts writes until closed");
        while scanner.scan() {
            check(&all, scanner.token(), &chain);
        }
        assert!(scanner.last_error().is_none());
    }
    ring.close();
    while scanner.scan() {
        check(&all, scanner.token(), &chain);
    }
    assert!(scanner.last_error().is_none());
    assert!(scanner.is_eof());
});
