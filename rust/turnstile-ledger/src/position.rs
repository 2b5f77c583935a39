//! Shard position tokens.
//!
//! Shard rows are keyed `"<name>:<position token>"`, and the storage layer
//! only offers lexicographic key ordering — so position tokens must sort
//! lexicographically in their numeric order to keep a counter's shards
//! clustered. The encoding is length-prefixed base62: the value in base62
//! digits (`0-9A-Za-z`, ascending ASCII), preceded by a letter encoding the
//! digit count (`A` for one digit, `B` for two, ...). Same-width tokens sort
//! digit-by-digit; narrower tokens sort before wider ones via the prefix.

use std::sync::LazyLock;

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// The largest supported shard count
pub(crate) const MAX_SHARDS: usize = 1000;

fn encode_position(mut position: usize) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(BASE62[position % 62]);
        position /= 62;
        if position == 0 {
            break;
        }
    }

    let mut token = String::with_capacity(digits.len() + 1);
    token.push(char::from(b'A' + (digits.len() as u8 - 1)));
    for digit in digits.into_iter().rev() {
        token.push(char::from(digit));
    }
    token
}

/// Position tokens for shard positions `0..MAX_SHARDS`
pub(crate) static POSITION_TOKENS: LazyLock<Vec<String>> =
    LazyLock::new(|| (0..MAX_SHARDS).map(encode_position).collect());

#[cfg(test)]
mod tests {
    use super::{MAX_SHARDS, POSITION_TOKENS, encode_position};

    #[test]
    fn tokens_sort_lexicographically_in_numeric_order() {
        for window in POSITION_TOKENS.windows(2) {
            assert!(
                window[0] < window[1],
                "{} should sort before {}",
                window[0],
                window[1]
            );
        }
        assert_eq!(POSITION_TOKENS.len(), MAX_SHARDS);
    }

    #[test]
    fn the_encoding_is_length_prefixed_base62() {
        assert_eq!(encode_position(0), "A0");
        assert_eq!(encode_position(9), "A9");
        assert_eq!(encode_position(10), "AA");
        assert_eq!(encode_position(61), "Az");
        assert_eq!(encode_position(62), "B10");
        assert_eq!(encode_position(999), "BG7");
    }
}
