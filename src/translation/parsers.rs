/// Two-byte lookahead: does `bytes[idx..]` start with `pair`?
fn pair_at(bytes: &[u8], idx: usize, pair: [u8; 2]) -> bool {
    bytes.get(idx..idx + 2) == Some(&pair[..])
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, *b"--")
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, *b"/*")
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, *b"*/")
}

/// A closing delimiter followed by itself (`''`, `""`, `]]`) is an escaped character, not the
/// end of the literal.
pub(super) fn is_doubled(bytes: &[u8], idx: usize, delimiter: u8) -> bool {
    pair_at(bytes, idx, [delimiter, delimiter])
}
