#![no_main]

use faultplan::shard::ShardSpec;
use libfuzzer_sys::{Corpus, arbitrary::Arbitrary, fuzz_target};

#[derive(Debug, Arbitrary)]
struct Input {
    len: u16,
    total: u8,
}

fuzz_target!(|input: Input| -> Corpus {
    let Input { len, total } = input;
    let (len, total) = (len as usize, total as usize);

    if total == 0 {
        return Corpus::Reject;
    }

    let base = len / total;
    let mut next_start = 0;
    for index in 0..total {
        let range = ShardSpec::new(index, total).unwrap().range(len);

        assert_eq!(range.start, next_start);
        assert!(range.len() == base || range.len() == base + 1);
        assert_eq!(range.len() == base + 1, index < len % total);
        next_start = range.end;
    }
    assert_eq!(next_start, len);

    Corpus::Keep
});
