#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    /// T-SQL `[bracketed identifier]`
    Bracketed,
    LineComment,
    BlockComment(u32),
}
