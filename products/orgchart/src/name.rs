/// Split a display name at its first ASCII space.
///
/// Returns the first-name token and the remainder. The remainder keeps any
/// further words ("van der Berg") and is empty for single-word names. Tabs
/// and other whitespace do not split.
pub fn split_name(full_name: &str) -> (&str, &str) {
    full_name.split_once(' ').unwrap_or((full_name, ""))
}

/// Sort key used for siblings: the last-name remainder of [`split_name`].
pub fn last_name_key(full_name: &str) -> &str {
    split_name(full_name).1
}
