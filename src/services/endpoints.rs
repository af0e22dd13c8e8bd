//! Service path templates
//!
//! Paths are relative to `<base_url>/<org>/<tenant>` and may contain
//! `{{ variable }}` placeholders.

/// Orchestrator tasks
pub mod tasks {
    pub const ACROSS_FOLDERS: &str =
        "/orchestrator_/odata/Tasks/UiPath.Server.Configuration.OData.GetTasksAcrossFolders";
    pub const IN_FOLDER: &str = "/orchestrator_/odata/Tasks";
    pub const BY_ID: &str = "/orchestrator_/odata/Tasks({{ id }})";
    pub const COMPLETE: &str = "/orchestrator_/tasks/GenericTasks/CompleteTask";
}

/// Orchestrator storage buckets
pub mod buckets {
    pub const ACROSS_FOLDERS: &str =
        "/orchestrator_/odata/Buckets/UiPath.Server.Configuration.OData.GetBucketsAcrossFolders";
    pub const IN_FOLDER: &str = "/orchestrator_/odata/Buckets";
    pub const BY_ID: &str = "/orchestrator_/odata/Buckets({{ id }})";
}

/// Data Fabric entity records
pub mod entities {
    pub const READ: &str = "/datafabric_/api/EntityService/entity/{{ entity_id }}/read";
    pub const INSERT: &str = "/datafabric_/api/EntityService/entity/{{ entity_id }}/insert";
}

/// Maestro process instances
pub mod process_instances {
    pub const LIST: &str = "/pims_/api/v1/instances";
    pub const BY_ID: &str = "/pims_/api/v1/instances/{{ id }}";
    pub const CANCEL: &str = "/pims_/api/v1/instances/{{ id }}/cancel";
}
