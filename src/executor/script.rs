/// Split a script into statements on `;`, trimming each and skipping empty fragments.
///
/// The split is purely textual: a `;` inside a string literal or a comment also ends a
/// statement. Scripts that need literal semicolons must be sent through `write` instead.
#[must_use]
pub fn split_script(script: &str) -> Vec<&str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}
