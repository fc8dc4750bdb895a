//! Markdown image-path rewriting
//!
//! Posts store images as `![alt](image/...)`, relative to the blog root. For
//! reading they are pointed at the backend's `/api/image/...` route; before
//! saving, those links are turned back into the relative form.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Prefix the backend serves blog images under
pub const API_IMAGE_PREFIX: &str = "/api";

fn stored_image_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[([^\]]*)\]\((image/[^)]+)\)").expect("valid regex"))
}

fn served_image_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[([^\]]*)\]\((?:/api)?/(image/[^)]+)\)").expect("valid regex"))
}

/// `![alt](image/x.png)` -> `![alt](/api/image/x.png)`
pub fn process_for_display(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    stored_image_link()
        .replace_all(content, |caps: &Captures| {
            format!("![{}]({}/{})", &caps[1], API_IMAGE_PREFIX, &caps[2])
        })
        .into_owned()
}

/// `![alt](/api/image/x.png)` or `![alt](/image/x.png)` -> `![alt](image/x.png)`
pub fn revert_for_save(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    served_image_link()
        .replace_all(content, |caps: &Captures| format!("![{}]({})", &caps[1], &caps[2]))
        .into_owned()
}
