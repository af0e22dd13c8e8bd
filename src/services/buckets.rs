//! Storage buckets

use super::{decode_item, endpoints};
use crate::client::{Client, Endpoint, RequestOptions, ServiceAccess};
use crate::error::Result;
use crate::pagination::{get_all, GetAllConfig, ListOptions, ListResponse, PaginationDescriptor};
use crate::template::{self, PathParams};
use crate::transform::{pascal_to_camel_keys, rename_fields};
use crate::types::{JsonValue, Method};
use serde::{Deserialize, Serialize};

/// A storage bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub storage_provider: Option<String>,
    #[serde(default)]
    pub folder_id: Option<i64>,
}

fn bucket_from_api(raw: JsonValue) -> JsonValue {
    rename_fields(
        pascal_to_camel_keys(raw),
        &[("organizationUnitId", "folderId")],
    )
}

/// Bucket operations
#[derive(Debug, Clone, Copy)]
pub struct BucketService<'a> {
    client: &'a Client,
}

impl<'a> BucketService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self, options), fields(folder_id = ?options.folder_id))]
    pub async fn get_all(&self, options: &ListOptions) -> Result<ListResponse<Bucket>> {
        let config = GetAllConfig::new(
            Endpoint::new(endpoints::buckets::ACROSS_FOLDERS)
                .with_folder_path(endpoints::buckets::IN_FOLDER),
            PaginationDescriptor::odata(),
        )
        .transform(bucket_from_api);
        get_all(self.client, &config, options).await
    }

    /// Buckets are folder entities, so the folder is required
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64, folder_id: i64) -> Result<Bucket> {
        let path = template::render(endpoints::buckets::BY_ID, &PathParams::new().with("id", id))?;
        let response = self
            .client
            .request(Method::GET, &path, RequestOptions::new().folder(Some(folder_id)))
            .await?
            .error_for_status()?;
        decode_item(response.data, bucket_from_api)
    }
}
