#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Schedule,
    Update,
    Delete,
    List,
    Quit,
    Unknown,
}

/// Maps a free-text action choice to an intent by keyword.
pub fn route_intent(text: &str) -> Intent {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return Intent::Unknown;
    }

    let has_any = |words: &[&str]| {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| words.contains(&token))
    };

    // "reschedule" must win over "schedule"
    if has_any(&["update", "reschedule", "change", "move"]) {
        return Intent::Update;
    }
    if has_any(&["delete", "cancel", "remove"]) {
        return Intent::Delete;
    }
    if has_any(&["schedule", "book", "create"]) {
        return Intent::Schedule;
    }
    if has_any(&["list", "show", "view"]) {
        return Intent::List;
    }
    if has_any(&["quit", "exit", "bye"]) {
        return Intent::Quit;
    }
    Intent::Unknown
}

/// `no`/`n` declines; anything else is taken as a yes.
pub fn is_negative(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "no" | "n" | "nope")
}
