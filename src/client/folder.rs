//! Folder endpoints, addressed through the owning sidebar.

use reqwest::Method;

use crate::error::ClientError;
use crate::models::folder::{Folder, Sidebar};

use super::{path, PortClient};

impl PortClient {
    /// Fetch a sidebar document.
    pub async fn get_sidebar(
        &self,
        sidebar: &str,
    ) -> Result<(Option<Sidebar>, u16), ClientError> {
        self.send(
            Method::GET,
            &path("v1/sidebars/{sidebar}", &[("sidebar", sidebar)]),
            &[],
            None,
            "sidebar",
        )
        .await
    }

    /// Fetch one folder by picking it out of the sidebar document. Returns
    /// `(None, 404)` when the sidebar exists but the folder does not.
    pub async fn get_folder(
        &self,
        sidebar: &str,
        identifier: &str,
    ) -> Result<(Option<Folder>, u16), ClientError> {
        let (doc, status) = self.get_sidebar(sidebar).await?;
        let Some(doc) = doc else {
            return Ok((None, status));
        };
        match doc.find_folder(identifier) {
            Some(item) => Ok((
                Some(Folder {
                    identifier: item.identifier.clone(),
                    title: item.title.clone(),
                    after: item.after.clone(),
                    parent: item.parent.clone(),
                    sidebar_type: item.sidebar_type.clone(),
                }),
                status,
            )),
            None => Ok((None, 404)),
        }
    }

    /// Create a folder. The server may answer with an empty body; callers
    /// follow up with a read.
    pub async fn create_folder(
        &self,
        sidebar: &str,
        folder: &Folder,
    ) -> Result<(Option<Folder>, u16), ClientError> {
        let body = serde_json::to_value(folder)?;
        self.send(
            Method::POST,
            &path("v1/sidebars/{sidebar}/folders", &[("sidebar", sidebar)]),
            &[],
            Some(&body),
            "folder",
        )
        .await
    }

    /// Patch a folder.
    pub async fn update_folder(
        &self,
        sidebar: &str,
        identifier: &str,
        folder: &Folder,
    ) -> Result<(Option<Folder>, u16), ClientError> {
        let body = serde_json::to_value(folder)?;
        self.send(
            Method::PATCH,
            &path(
                "v1/sidebars/{sidebar}/folders/{id}",
                &[("sidebar", sidebar), ("id", identifier)],
            ),
            &[],
            Some(&body),
            "folder",
        )
        .await
    }

    /// Delete a folder.
    pub async fn delete_folder(
        &self,
        sidebar: &str,
        identifier: &str,
    ) -> Result<u16, ClientError> {
        self.send_expect_ok(
            Method::DELETE,
            &path(
                "v1/sidebars/{sidebar}/folders/{id}",
                &[("sidebar", sidebar), ("id", identifier)],
            ),
            &[],
            None,
        )
        .await
    }
}
