//! Terminal output for blogctl
//!
//! Colored status lines, a spinner for slow requests, and renderers for
//! posts, settings and streamed chat replies.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::cli::Verbosity;
use crate::streaming::{SseEvent, StreamCallbacks, StreamFailure};
use crate::types::{BlogDetail, BlogListItem, ImageUploadResponse, SystemConfig, User};

const SPINNER_TICK: Duration = Duration::from_millis(100);
const TITLE_WIDTH: usize = 40;

/// Output front end for one CLI invocation
#[derive(Debug, Clone, Copy)]
pub struct Display {
    verbosity: Verbosity,
}

impl Display {
    /// Create a display; `color == false` turns colored output off process-wide
    pub fn new(verbosity: Verbosity, color: bool) -> Self {
        if !color {
            colored::control::set_override(false);
        }
        Display { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Spinner shown while waiting on the backend; `None` in quiet mode
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.verbosity.show_progress() {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(SPINNER_TICK);
        Some(pb)
    }

    pub fn success(&self, message: &str) {
        if self.verbosity != Verbosity::Quiet {
            println!("{} {}", "✓".green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message.red());
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", "Warning:".yellow().bold(), message.yellow());
    }

    pub fn info(&self, message: &str) {
        if self.verbosity != Verbosity::Quiet {
            println!("{} {}", "Info:".cyan(), message);
        }
    }

    /// Section header
    pub fn section(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "-".repeat(60).cyan());
    }

    pub fn user(&self, user: &User) {
        println!("{} {} <{}> (id {})", "●".green(), user.username.bold(), user.email, user.id);
    }

    /// One line per post
    pub fn blog_table(&self, blogs: &[BlogListItem]) {
        if blogs.is_empty() {
            println!("{}", "(no posts)".dimmed());
            return;
        }
        println!(
            "{:>5}  {:<19}  {:<width$}  {}",
            "ID".bold(),
            "DATE".bold(),
            "TITLE".bold(),
            "CATEGORY / TAGS".bold(),
            width = TITLE_WIDTH
        );
        for blog in blogs {
            println!("{}", format_blog_row(blog));
        }
    }

    pub fn blog_detail(&self, detail: &BlogDetail) {
        let item = &detail.item;
        println!("{}", item.title.bold().cyan());
        println!("{} {}", "date:".dimmed(), item.date_time);
        println!("{} {}", "file:".dimmed(), item.filename);
        if !item.categories.is_empty() {
            println!("{} {}", "categories:".dimmed(), item.categories);
        }
        if !item.tags.is_empty() {
            println!("{} {}", "tags:".dimmed(), item.tags.join(", "));
        }
        if !item.saying.is_empty() {
            println!("{} {}", "saying:".dimmed(), item.saying.italic());
        }
        println!("{}", "-".repeat(60).dimmed());
        println!("{}", detail.content);
    }

    /// Backend settings with API keys masked
    pub fn system_config(&self, config: &SystemConfig) {
        println!("{:<18} {}", "blogStoragePath".bold(), config.blog_storage_path);
        println!("{:<18} {}", "imageStoragePath".bold(), config.image_storage_path);
        println!("{:<18} {}", "xmodelAPIKey".bold(), mask_secret(&config.xmodel_api_key));
        println!("{:<18} {}", "bigmodelAPIKey".bold(), mask_secret(&config.bigmodel_api_key));
    }

    pub fn upload_result(&self, result: &ImageUploadResponse) {
        if result.success {
            let path = result.path.as_deref().unwrap_or("");
            self.success(&format!("Uploaded {}", path));
            if let Some(id) = &result.image_id {
                println!("  {} {}", "image id:".dimmed(), id);
            }
        } else {
            self.error(&result.message);
        }
    }
}

/// `   12  2024-05-01 10:00:00  Title…  category [a, b]`
pub fn format_blog_row(blog: &BlogListItem) -> String {
    let tags = if blog.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", blog.tags.join(", "))
    };
    format!(
        "{:>5}  {:<19}  {:<width$}  {}{}",
        blog.id,
        blog.date_time,
        truncate(&blog.title, TITLE_WIDTH),
        blog.categories,
        tags,
        width = TITLE_WIDTH
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Keep the last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return "(unset)".to_string();
    }
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

/// Prints a streamed reply to stdout as it arrives
#[derive(Debug, Default)]
pub struct ChatRenderer {
    received: usize,
}

impl ChatRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamCallbacks for ChatRenderer {
    fn on_chunk(&mut self, text: &str, _event: &SseEvent) {
        self.received += text.len();
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    fn on_error_event(&mut self, event: &SseEvent) {
        eprintln!("\n{} {}", "Warning:".yellow().bold(), event.data.yellow());
    }

    fn on_stream_error(&mut self, error: &StreamFailure) {
        eprintln!("\n{} {}", "Error:".red().bold(), error.to_string().red());
    }

    fn on_complete(&mut self) {
        if self.received > 0 {
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog(title: &str, tags: &[&str]) -> BlogListItem {
        BlogListItem {
            id: 12,
            title: title.to_string(),
            filename: "f.md".to_string(),
            categories: "notes".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            saying: String::new(),
            date_time: "2024-05-01 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_blog_row_includes_tags() {
        let row = format_blog_row(&blog("Hello", &["a", "b"]));
        assert!(row.contains("   12"));
        assert!(row.contains("Hello"));
        assert!(row.ends_with("notes [a, b]"));
    }

    #[test]
    fn test_blog_row_truncates_long_titles() {
        let long = "x".repeat(80);
        let row = format_blog_row(&blog(&long, &[]));
        assert!(row.contains('…'));
        assert!(!row.contains(&long));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "(unset)");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("sk-123456"), "*****3456");
    }

    #[test]
    fn test_spinner_hidden_when_quiet() {
        assert!(Display::new(Verbosity::Quiet, false).spinner("x").is_none());
        let pb = Display::new(Verbosity::Normal, false).spinner("x");
        assert!(pb.is_some());
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
    }

    #[test]
    fn test_chat_renderer_counts_text() {
        let mut renderer = ChatRenderer::new();
        let event = SseEvent::new("chunk", "{}");
        renderer.on_chunk("hello", &event);
        renderer.on_complete();
        assert_eq!(renderer.received, 5);
    }
}
