/// Derives the conversation id for an unordered pair of usernames: the two
/// names sorted lexicographically and joined with `#`. Symmetric, so both
/// participants' messages land in the same partition no matter who sends.
///
/// Usernames containing `#` make the id ambiguous to split; nothing in the
/// login path rejects them, which matches the original behavior.
pub fn conversation_id(user_a: &str, user_b: &str) -> String {
    let mut pair = [user_a, user_b];
    pair.sort();
    pair.join("#")
}
