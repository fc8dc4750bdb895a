//! Blog CRUD against `/api/blogs`
//!
//! Every endpoint wraps its payload in `{status, data, error}`. HTTP-level
//! failures surface as [`ClientError::Http`]; a 2xx reply whose envelope
//! reports a non-zero status surfaces as [`ClientError::Api`].

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::api::http::ApiClient;
use crate::content::{process_for_display, revert_for_save};
use crate::errors::{ClientError, Result};
use crate::types::{AddedBlog, ApiResponse, BlogDetail, BlogKey, BlogListItem, BlogMeta, OpOutcome};

/// Blog management calls
#[derive(Debug, Clone)]
pub struct BlogService {
    api: ApiClient,
}

impl BlogService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /api/blogs/lists`
    pub async fn list_blogs(&self) -> Result<Vec<BlogListItem>> {
        let url = self.api.url(&["api", "blogs", "lists"])?;
        let envelope: ApiResponse<Vec<BlogListItem>> = self.fetch(self.api.get(url)).await?;
        let blogs = envelope
            .into_result("failed to fetch blogs")
            .map_err(|e| log_failure("Error fetching blogs", e))?
            .unwrap_or_default();
        debug!(count = blogs.len(), "fetched blog list");
        Ok(blogs)
    }

    /// Look a list entry up by its numeric id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<BlogListItem>> {
        Ok(self.list_blogs().await?.into_iter().find(|b| b.id == id))
    }

    /// `GET /api/blogs/{y}/{m}/{d}/{filename}/`; image links are rewritten for display
    pub async fn get_blog_detail(&self, key: &BlogKey) -> Result<Option<BlogDetail>> {
        let url = self.api.url_with_slash(&self.post_path(key, None))?;
        let envelope: ApiResponse<BlogDetail> = self.fetch(self.api.get(url)).await?;
        let detail = envelope
            .into_result("failed to fetch blog detail")
            .map_err(|e| log_failure("Error fetching blog detail", e))?;

        Ok(detail.map(|mut d| {
            d.content = process_for_display(&d.content);
            d
        }))
    }

    /// `POST .../updatecontent` with the markdown as `text/plain`
    pub async fn update_blog_content(&self, key: &BlogKey, content: &str) -> Result<OpOutcome> {
        let url = self.api.url(&self.post_path(key, Some("updatecontent")))?;
        let body = revert_for_save(content);
        let request = self
            .api
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body);

        let envelope: ApiResponse<serde_json::Value> = self.fetch(request).await?;
        envelope
            .into_result("failed to update blog content")
            .map_err(|e| log_failure("Error updating blog content", e))?;
        info!(post = %key, "blog content updated");
        Ok(OpOutcome::ok("blog content updated"))
    }

    /// `GET /api/blogs/add?title=&categories=&saying=&tags=...`
    pub async fn add_blog(&self, meta: &BlogMeta) -> Result<OpOutcome> {
        let url = self.api.url(&["api", "blogs", "add"])?;
        let mut query: Vec<(&str, &str)> = vec![
            ("title", meta.title.as_str()),
            ("categories", meta.categories.as_str()),
            ("saying", meta.saying.as_str()),
        ];
        query.extend(meta.tags.iter().map(|t| ("tags", t.as_str())));

        let envelope: ApiResponse<AddedBlog> = self.fetch(self.api.get(url).query(&query)).await?;
        let added = envelope
            .into_result("failed to add blog")
            .map_err(|e| log_failure("Error adding blog", e))?;

        let filename = added.map(|a| a.filename);
        info!(title = %meta.title, filename = ?filename, "blog added");
        Ok(OpOutcome {
            success: true,
            message: "blog added".to_string(),
            filename,
        })
    }

    /// `GET .../delete/`
    pub async fn delete_blog(&self, key: &BlogKey) -> Result<OpOutcome> {
        let url = self.api.url_with_slash(&self.post_path(key, Some("delete")))?;
        let envelope: ApiResponse<serde_json::Value> = self.fetch(self.api.get(url)).await?;
        envelope
            .into_result("failed to delete blog")
            .map_err(|e| log_failure("Error deleting blog", e))?;
        info!(post = %key, "blog deleted");
        Ok(OpOutcome::ok("blog deleted"))
    }

    /// `GET .../updateinfo?title=&categories=&tags=...&saying=`
    pub async fn update_blog_info(&self, key: &BlogKey, meta: &BlogMeta) -> Result<OpOutcome> {
        let url = self.api.url(&self.post_path(key, Some("updateinfo")))?;
        let mut query: Vec<(&str, &str)> = vec![
            ("title", meta.title.as_str()),
            ("categories", meta.categories.as_str()),
        ];
        query.extend(meta.tags.iter().map(|t| ("tags", t.as_str())));
        query.push(("saying", meta.saying.as_str()));

        let envelope: ApiResponse<serde_json::Value> =
            self.fetch(self.api.get(url).query(&query)).await?;
        envelope
            .into_result("failed to update blog info")
            .map_err(|e| log_failure("Error updating blog info", e))?;
        info!(post = %key, "blog info updated");
        Ok(OpOutcome::ok("blog info updated"))
    }

    fn post_path<'a>(&self, key: &'a BlogKey, action: Option<&'a str>) -> Vec<&'a str> {
        let mut segments = vec![
            "api",
            "blogs",
            key.year.as_str(),
            key.month.as_str(),
            key.day.as_str(),
            key.filename.as_str(),
        ];
        if let Some(action) = action {
            segments.push(action);
        }
        segments
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ApiResponse<T>> {
        let response = self.api.send_checked(request).await?;
        Ok(response.json().await?)
    }
}

fn log_failure(context: &str, err: ClientError) -> ClientError {
    error!("{}: {}", context, err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use tempfile::TempDir;

    #[test]
    fn test_post_path_segments() {
        let dir = TempDir::new().unwrap();
        let api = ApiClient::new("http://localhost:5200", SessionStore::new(dir.path())).unwrap();
        let service = BlogService::new(api.clone());
        let key = BlogKey::new("2024", "05", "01", "a b.md");

        let url = api
            .url_with_slash(&service.post_path(&key, Some("delete")))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5200/api/blogs/2024/05/01/a%20b.md/delete/"
        );

        let url = api.url(&service.post_path(&key, Some("updateinfo"))).unwrap();
        assert!(url.as_str().ends_with("/a%20b.md/updateinfo"));
    }
}
