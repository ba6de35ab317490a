use anyhow::{Context, Result};
use async_trait::async_trait;
use gcloud_gax::grpc::Code;
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::client::{Client, ClientConfig};
use gcloud_spanner::mutation::insert_or_update;
use gcloud_spanner::statement::Statement;
use gcloud_spanner::value::CommitTimestamp;
use std::sync::Arc;

use crate::config::SpannerConfig;
use crate::store::KvBackend;

const TABLE: &str = "documents";

const CREATE_TABLE_DDL: &str = r#"
CREATE TABLE documents (
    id STRING(MAX) NOT NULL,
    data STRING(MAX) NOT NULL,
    created_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (id)
"#;

/// Document backend on Google Cloud Spanner
///
/// Writes use `insert_or_update`, so a colliding key replaces the earlier
/// document exactly as the in-memory backend does.
#[derive(Clone)]
pub struct SpannerBackend {
    inner: Arc<Client>,
}

impl SpannerBackend {
    /// Connect to Spanner, provisioning the instance, database and table first
    ///
    /// `ClientConfig::default()` picks up `SPANNER_EMULATOR_HOST` from the
    /// process environment, so the emulator host in `config` must also be
    /// exported there.
    pub async fn connect(config: &SpannerConfig) -> Result<Self> {
        auto_provision(config).await?;

        let database_path = config.database_path();

        match &config.emulator_host {
            Some(host) => tracing::info!("Connecting to Spanner emulator at: {}", host),
            None => tracing::info!("Connecting to production Spanner"),
        }

        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!("Connected to Spanner database: {}", database_path);

        Ok(Self {
            inner: Arc::new(client),
        })
    }
}

#[async_trait]
impl KvBackend for SpannerBackend {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let id = key.to_string();
        let data = value.to_string();

        let mutation = insert_or_update(
            TABLE,
            &["id", "data", "created_at"],
            &[&id, &data, &CommitTimestamp::new()],
        );

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to write document to Spanner")?;

        tracing::debug!("Wrote document {} to Spanner", key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut statement = Statement::new("SELECT data FROM documents WHERE id = @id");
        statement.add_param("id", &key.to_string());

        let mut tx = self
            .inner
            .single()
            .await
            .context("Failed to create read transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to query document from Spanner")?;

        match result_set.next().await? {
            Some(row) => {
                let data: String = row.column_by_name("data")?;
                tracing::debug!("Read document {} from Spanner", key);
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }
}

/// Create the configured instance, database and table when they are missing
async fn auto_provision(config: &SpannerConfig) -> Result<()> {
    tracing::info!("Starting auto-provisioning checks...");

    let admin_client = AdminClient::new(AdminClientConfig::default())
        .await
        .context("Failed to create Spanner admin client")?;

    let project_path = format!("projects/{}", config.project);
    let instance_path = format!("{}/instances/{}", project_path, config.instance);
    let database_path = config.database_path();

    ensure_instance(&admin_client, config, &project_path, &instance_path).await?;
    ensure_database(&admin_client, config, &instance_path, &database_path).await?;
    ensure_table(&admin_client, &database_path).await?;

    tracing::info!("Auto-provisioning complete");
    Ok(())
}

async fn ensure_instance(
    admin_client: &AdminClient,
    config: &SpannerConfig,
    project_path: &str,
    instance_path: &str,
) -> Result<()> {
    let request = GetInstanceRequest {
        name: instance_path.to_string(),
        field_mask: None,
    };

    match admin_client.instance().get_instance(request, None).await {
        Ok(_) => {
            tracing::info!("Instance already exists: {}", instance_path);
            Ok(())
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("Instance not found, creating: {}", instance_path);

            let instance_config = if config.emulator_host.is_some() {
                format!("{}/instanceConfigs/emulator-config", project_path)
            } else {
                format!("{}/instanceConfigs/regional-us-central1", project_path)
            };

            let create_request = CreateInstanceRequest {
                parent: project_path.to_string(),
                instance_id: config.instance.clone(),
                instance: Some(Instance {
                    name: instance_path.to_string(),
                    config: instance_config,
                    display_name: format!("{} instance", config.instance),
                    node_count: 1,
                    ..Default::default()
                }),
            };

            admin_client
                .instance()
                .create_instance(create_request, None)
                .await
                .context("Failed to start instance creation")?
                .wait(None)
                .await
                .context("Failed to create instance")?;

            tracing::info!("Instance created: {}", instance_path);
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(
            "Failed to check instance existence: {}",
            e.message()
        )),
    }
}

async fn ensure_database(
    admin_client: &AdminClient,
    config: &SpannerConfig,
    instance_path: &str,
    database_path: &str,
) -> Result<()> {
    let request = GetDatabaseRequest {
        name: database_path.to_string(),
    };

    match admin_client.database().get_database(request, None).await {
        Ok(_) => {
            tracing::info!("Database already exists: {}", database_path);
            Ok(())
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("Database not found, creating: {}", database_path);

            let create_request = CreateDatabaseRequest {
                parent: instance_path.to_string(),
                create_statement: format!("CREATE DATABASE `{}`", config.database),
                extra_statements: vec![],
                encryption_config: None,
                database_dialect: 1, // Google Standard SQL
                proto_descriptors: vec![],
            };

            admin_client
                .database()
                .create_database(create_request, None)
                .await
                .context("Failed to start database creation")?
                .wait(None)
                .await
                .context("Failed to create database")?;

            tracing::info!("Database created: {}", database_path);
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(
            "Failed to check database existence: {}",
            e.message()
        )),
    }
}

async fn ensure_table(admin_client: &AdminClient, database_path: &str) -> Result<()> {
    let request = GetDatabaseDdlRequest {
        database: database_path.to_string(),
    };

    let ddl = admin_client
        .database()
        .get_database_ddl(request, None)
        .await
        .context("Failed to get database DDL")?
        .into_inner();

    if ddl.statements.iter().any(|stmt| declares_table(stmt)) {
        tracing::info!("Table '{}' already exists", TABLE);
        return Ok(());
    }

    tracing::info!("Table '{}' not found, creating...", TABLE);

    let update_request = UpdateDatabaseDdlRequest {
        database: database_path.to_string(),
        statements: vec![CREATE_TABLE_DDL.trim().to_string()],
        operation_id: String::new(),
        proto_descriptors: vec![],
        throughput_mode: false,
    };

    admin_client
        .database()
        .update_database_ddl(update_request, None)
        .await
        .context("Failed to start table creation")?
        .wait(None)
        .await
        .context("Failed to create table")?;

    tracing::info!("Table '{}' created", TABLE);
    Ok(())
}

fn declares_table(statement: &str) -> bool {
    statement.contains("CREATE TABLE documents ") || statement.contains("CREATE TABLE `documents`")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulator_config(instance: &str) -> SpannerConfig {
        SpannerConfig {
            emulator_host: Some("localhost:9010".to_string()),
            project: "test-project".to_string(),
            instance: instance.to_string(),
            database: format!("{}-db", instance),
        }
    }

    #[test]
    fn test_backend_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<SpannerBackend>();
    }

    #[test]
    fn test_declares_table() {
        assert!(declares_table(CREATE_TABLE_DDL.trim()));
        assert!(declares_table("CREATE TABLE `documents` (id STRING(MAX))"));
        assert!(!declares_table("CREATE TABLE documents_archive (id STRING(256))"));
        assert!(!declares_table("CREATE TABLE kv_store (id STRING(36))"));
    }

    #[test]
    fn test_key_column_accepts_any_configured_length() {
        // KEY_LENGTH is bounded by config, not by the column
        assert!(CREATE_TABLE_DDL.contains("id STRING(MAX) NOT NULL"));
        assert!(!CREATE_TABLE_DDL.contains("STRING(256)"));
    }

    #[tokio::test]
    async fn test_round_trip_with_emulator() {
        unsafe {
            std::env::set_var("SPANNER_EMULATOR_HOST", "localhost:9010");
        }

        let result = SpannerBackend::connect(&emulator_config("haste-roundtrip")).await;

        unsafe {
            std::env::remove_var("SPANNER_EMULATOR_HOST");
        }

        let backend = match result {
            Ok(backend) => backend,
            Err(e) => {
                // Emulator not running
                let msg = e.to_string();
                assert!(
                    msg.contains("Failed to create Spanner")
                        || msg.contains("Failed to start")
                        || msg.contains("Failed to check")
                        || msg.contains("Failed to get"),
                    "Error should have context: {}",
                    msg
                );
                return;
            }
        };

        backend.put("spannertest", "hello spanner").await.unwrap();
        assert_eq!(
            backend.get("spannertest").await.unwrap(),
            Some("hello spanner".to_string())
        );
        assert_eq!(backend.get("nosuchdocument").await.unwrap(), None);
    }
}
