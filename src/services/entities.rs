//! Data Fabric entity records

use super::endpoints;
use crate::client::{Client, Endpoint, RequestOptions};
use crate::error::Result;
use crate::pagination::{
    get_all, GetAllConfig, ListOptions, ListResponse, PaginationDescriptor, PaginationParams,
};
use crate::template::{self, PathParams};
use crate::types::{JsonObject, JsonValue, Method};

/// Records are schemaless; fields follow the entity definition
pub type EntityRecord = JsonObject;

/// Entity record operations
#[derive(Debug, Clone, Copy)]
pub struct EntityService<'a> {
    client: &'a Client,
}

impl<'a> EntityService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Read records of one entity; `expansionLevel` is passed through unprefixed
    #[tracing::instrument(skip(self, options))]
    pub async fn get_records(
        &self,
        entity_id: &str,
        options: &ListOptions,
    ) -> Result<ListResponse<EntityRecord>> {
        let path = template::render(
            endpoints::entities::READ,
            &PathParams::new().with("entity_id", entity_id),
        )?;
        let config = GetAllConfig::new(
            Endpoint::new(path),
            PaginationDescriptor::offset(
                "value",
                "totalCount",
                PaginationParams::offset("limit", "start"),
            ),
        )
        .query_prefix(Some("$"))
        .exclude_from_prefix(["expansionLevel"]);
        get_all(self.client, &config, options).await
    }

    /// Insert one record, returning it as stored (with its generated id)
    #[tracing::instrument(skip(self, record))]
    pub async fn insert_record(
        &self,
        entity_id: &str,
        record: &EntityRecord,
    ) -> Result<EntityRecord> {
        let path = template::render(
            endpoints::entities::INSERT,
            &PathParams::new().with("entity_id", entity_id),
        )?;
        self.client
            .request_json(
                Method::POST,
                &path,
                RequestOptions::new().json(JsonValue::Object(record.clone())),
            )
            .await
    }
}
