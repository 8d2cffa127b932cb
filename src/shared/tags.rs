/// Adds a tag or label to a set, mirroring the editor add behavior: the
/// candidate is trimmed, and blank or already-present values leave the set
/// unchanged (same length, same membership).
pub fn add_tag(tags: &[String], candidate: &str) -> Vec<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || tags.iter().any(|t| t == trimmed) {
        return tags.to_vec();
    }

    let mut next = tags.to_vec();
    next.push(trimmed.to_string());
    next
}
