//! Page endpoints.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::page::Page;

use super::{path, PortClient};

impl PortClient {
    /// Fetch a page.
    pub async fn get_page(&self, identifier: &str) -> Result<(Option<Page>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/pages/{id}", &[("id", identifier)]),
            &[],
            None,
            "page",
        )
        .await
    }

    /// Create a page. The server may answer with an empty body; callers
    /// follow up with a read.
    pub async fn create_page(&self, page: &Page) -> Result<(Option<Page>, u16), ClientError> {
        let body = serde_json::to_value(page)?;
        self.send(Method::POST, "v1/pages", &[], Some(&body), "page")
            .await
    }

    /// Replace a page document.
    pub async fn update_page(
        &self,
        identifier: &str,
        page: &Page,
    ) -> Result<(Option<Page>, u16), ClientError> {
        let body = serde_json::to_value(page)?;
        self.send(
            Method::PUT,
            &path("v1/pages/{id}", &[("id", identifier)]),
            &[],
            Some(&body),
            "page",
        )
        .await
    }

    /// Delete a page.
    pub async fn delete_page(&self, identifier: &str) -> Result<u16, ClientError> {
        self.send_expect_ok(
            Method::DELETE,
            &path("v1/pages/{id}", &[("id", identifier)]),
            &[],
            None,
        )
        .await
    }
}
