//! Shared helpers for command handlers.

/// `"-"` for a missing value.
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}

/// Comma-joined list, `"-"` when empty.
pub fn join_or_dash<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return "-".into();
    }
    items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
}

pub fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_render_as_dash() {
        let empty: [&str; 0] = [];
        assert_eq!(join_or_dash(&empty), "-");
        assert_eq!(join_or_dash(&["users", "roles"]), "users, roles");
        assert_eq!(or_dash(None), "-");
    }
}
