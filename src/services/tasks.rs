//! Action Center tasks

use super::{decode_item, endpoints};
use crate::client::{Client, Endpoint, RequestOptions, ServiceAccess};
use crate::error::Result;
use crate::pagination::{get_all, GetAllConfig, ListOptions, ListResponse, PaginationDescriptor};
use crate::template::{self, PathParams};
use crate::transform::{pascal_to_camel_keys, rename_fields};
use crate::types::{JsonValue, Method};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// A human task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(rename = "type", default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified_time: Option<DateTime<Utc>>,
}

/// Outcome submitted when completing a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAction {
    /// Action name, e.g. `approve`
    pub action: String,
    /// Form data submitted with the action
    #[serde(default)]
    pub data: JsonValue,
}

impl TaskAction {
    pub fn new(action: impl Into<String>, data: JsonValue) -> Self {
        Self {
            action: action.into(),
            data,
        }
    }
}

fn task_from_api(raw: JsonValue) -> JsonValue {
    rename_fields(
        pascal_to_camel_keys(raw),
        &[
            ("creationTime", "createdTime"),
            ("lastModificationTime", "lastModifiedTime"),
            ("organizationUnitId", "folderId"),
        ],
    )
}

/// Task operations
#[derive(Debug, Clone, Copy)]
pub struct TaskService<'a> {
    client: &'a Client,
}

impl<'a> TaskService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn list_config() -> GetAllConfig {
        GetAllConfig::new(
            Endpoint::new(endpoints::tasks::ACROSS_FOLDERS)
                .with_folder_path(endpoints::tasks::IN_FOLDER),
            PaginationDescriptor::odata(),
        )
        .transform(task_from_api)
    }

    /// List tasks across folders, or in one folder when `options` names it
    #[tracing::instrument(skip(self, options), fields(folder_id = ?options.folder_id))]
    pub async fn get_all(&self, options: &ListOptions) -> Result<ListResponse<Task>> {
        get_all(self.client, &Self::list_config(), options).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64, folder_id: Option<i64>) -> Result<Task> {
        let path = template::render(endpoints::tasks::BY_ID, &PathParams::new().with("id", id))?;
        let response = self
            .client
            .request(Method::GET, &path, RequestOptions::new().folder(folder_id))
            .await?
            .error_for_status()?;
        decode_item(response.data, task_from_api)
    }

    /// Submit an action for a task in `folder_id`
    #[tracing::instrument(skip(self, action), fields(action = %action.action))]
    pub async fn complete(&self, id: i64, folder_id: i64, action: &TaskAction) -> Result<()> {
        let body = json!({
            "taskId": id,
            "action": action.action,
            "data": action.data,
        });
        self.client
            .request(
                Method::POST,
                endpoints::tasks::COMPLETE,
                RequestOptions::new().folder(Some(folder_id)).json(body),
            )
            .await?
            .error_for_status()?;
        info!("Completed task {id} with action '{}'", action.action);
        Ok(())
    }
}
