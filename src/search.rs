//! Client-side filtering of the blog list

use crate::types::BlogListItem;

/// Filter criteria; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogQuery {
    /// Substring of title, categories, saying or any tag
    pub keyword: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// Exact tag
    pub tag: Option<String>,
}

impl BlogQuery {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.as_deref().map_or(true, |k| k.trim().is_empty())
            && self.category.is_none()
            && self.tag.is_none()
    }

    pub fn matches(&self, blog: &BlogListItem) -> bool {
        if let Some(keyword) = self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            let needle = fold(keyword);
            let hit = fold(&blog.title).contains(&needle)
                || fold(&blog.categories).contains(&needle)
                || fold(&blog.saying).contains(&needle)
                || blog.tags.iter().any(|t| fold(t).contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if fold(&blog.categories) != fold(category.trim()) {
                return false;
            }
        }

        if let Some(tag) = &self.tag {
            let wanted = fold(tag.trim());
            if !blog.tags.iter().any(|t| fold(t) == wanted) {
                return false;
            }
        }

        true
    }
}

fn fold(s: &str) -> String {
    s.to_lowercase()
}

/// Matching entries, in their original order
pub fn search<'a>(blogs: &'a [BlogListItem], query: &BlogQuery) -> Vec<&'a BlogListItem> {
    blogs.iter().filter(|b| query.matches(b)).collect()
}
