//! Maestro process instances

use super::{decode_item, endpoints};
use crate::client::{Client, Endpoint, RequestOptions, ServiceAccess};
use crate::error::Result;
use crate::pagination::{
    get_all, GetAllConfig, ListOptions, ListResponse, PaginationDescriptor, PaginationParams,
};
use crate::template::{self, PathParams};
use crate::transform::rename_fields;
use crate::types::{JsonValue, Method};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// One run of a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInstance {
    pub instance_id: String,
    #[serde(default)]
    pub process_key: Option<String>,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub folder_key: Option<String>,
    #[serde(default)]
    pub latest_run_status: Option<String>,
    #[serde(default)]
    pub started_time: Option<DateTime<Utc>>,
}

fn instance_from_api(raw: JsonValue) -> JsonValue {
    rename_fields(raw, &[("startedTimeUtc", "startedTime")])
}

/// Process instance operations
#[derive(Debug, Clone, Copy)]
pub struct ProcessInstanceService<'a> {
    client: &'a Client,
}

impl<'a> ProcessInstanceService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List instances; pages follow continuation tokens, so `jump_to_page`
    /// is rejected
    #[tracing::instrument(skip(self, options), fields(folder_id = ?options.folder_id))]
    pub async fn get_all(&self, options: &ListOptions) -> Result<ListResponse<ProcessInstance>> {
        let config = GetAllConfig::new(
            Endpoint::new(endpoints::process_instances::LIST),
            PaginationDescriptor::token(
                "instances",
                "nextPage",
                PaginationParams::token("pageSize", "nextPage"),
            ),
        )
        .transform(instance_from_api);
        get_all(self.client, &config, options).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<ProcessInstance> {
        let path = template::render(
            endpoints::process_instances::BY_ID,
            &PathParams::new().with("id", id),
        )?;
        let response = self
            .client
            .request(Method::GET, &path, RequestOptions::new())
            .await?
            .error_for_status()?;
        decode_item(response.data, instance_from_api)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: &str, comment: Option<&str>) -> Result<()> {
        let path = template::render(
            endpoints::process_instances::CANCEL,
            &PathParams::new().with("id", id),
        )?;
        self.client
            .request(
                Method::POST,
                &path,
                RequestOptions::new().json(json!({ "comment": comment })),
            )
            .await?
            .error_for_status()?;
        info!("Cancelled process instance {id}");
        Ok(())
    }
}
