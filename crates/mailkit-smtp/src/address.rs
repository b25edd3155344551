//! Envelope address helpers.

/// Wraps `address` in angle brackets, adding only the missing ones.
///
/// `user@example.com` and `<user@example.com>` both give
/// `<user@example.com>`.
#[must_use]
pub fn bracketed(address: &str) -> String {
    let mut wrapped = String::with_capacity(address.len() + 2);
    if !address.starts_with('<') {
        wrapped.push('<');
    }
    wrapped.push_str(address);
    if !address.ends_with('>') {
        wrapped.push('>');
    }
    wrapped
}

/// Envelope recipients of one message: `to`, then `cc` when not empty.
#[must_use]
pub fn recipients(to: &str, cc: &str) -> Vec<String> {
    let mut list = vec![to.to_string()];
    if !cc.is_empty() {
        list.push(cc.to_string());
    }
    list
}
