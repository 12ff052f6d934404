//! Schema registry and per-schema facades.
//!
//! [`Schemas`] caches the schema definitions fetched from `GET /schema` and
//! refreshes them after every schema mutation. [`Schema`] is a lightweight
//! handle bound to one schema name: content CRUD under `/content/<name>` plus
//! realtime subscriptions scoped to that schema. Handles hold a copy of the
//! definition, never a reference into the cache, so a refresh never
//! invalidates them.

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{FastSchemaError, Result};
use crate::helpers::{content_filter_query, encode_path_segment};
use crate::models::{
    Field, ListOptions, Pagination, RecordId, SchemaData, SchemaUpdateData, Scope, UploadFile,
    UploadResult,
};
use crate::realtime::{EventCallback, Realtime, SubscriptionHandle};
use crate::transport::Transport;

/// Name of the built-in media schema.
pub const FILE_SCHEMA: &str = "file";

/// Cached schema definitions.
#[derive(Clone)]
pub struct Schemas {
    transport: Transport,
    realtime: Realtime,
    cache: Arc<RwLock<Vec<SchemaData>>>,
}

impl Schemas {
    pub(crate) fn new(transport: Transport, realtime: Realtime) -> Self {
        Self {
            transport,
            realtime,
            cache: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, Vec<SchemaData>> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Vec<SchemaData>> {
        self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle(&self, data: SchemaData) -> Schema {
        Schema {
            data,
            transport: self.transport.clone(),
            realtime: self.realtime.clone(),
        }
    }

    /// Replace the cache with the server's current definitions.
    pub async fn sync(&self) -> Result<()> {
        let schemas: Vec<SchemaData> = self.transport.get("/schema").await?;
        debug!("[FS_SCHEMA] Synced {} schema(s)", schemas.len());
        *self.write_cache() = schemas;
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.read_cache().iter().any(|s| s.name == name)
    }

    /// Handle for `name`. Before a sync, or for an unknown name, the handle
    /// carries an empty definition; CRUD and realtime still work since they
    /// only need the name.
    pub fn schema(&self, name: &str) -> Schema {
        let data = self
            .read_cache()
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .unwrap_or_else(|| SchemaData::placeholder(name));
        self.handle(data)
    }

    /// Handles for every cached schema.
    pub fn all(&self) -> Vec<Schema> {
        let cached = self.read_cache().clone();
        cached.into_iter().map(|data| self.handle(data)).collect()
    }

    pub async fn create(&self, schema: &SchemaData) -> Result<Schema> {
        let created: SchemaData = self.transport.post("/schema", schema).await?;
        debug!("[FS_SCHEMA] Created schema '{}'", created.name);
        self.sync().await?;
        Ok(self.handle(created))
    }

    pub async fn update(&self, name: &str, update: &SchemaUpdateData) -> Result<Schema> {
        let name = require_name(name)?;
        let updated: SchemaData =
            self.transport.put(&format!("/schema/{}", encode_path_segment(name)), update).await?;
        debug!("[FS_SCHEMA] Updated schema '{}' -> '{}'", name, updated.name);
        self.sync().await?;
        Ok(self.handle(updated))
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let name = require_name(name)?;
        let _: JsonValue = self.transport.delete(&format!("/schema/{}", encode_path_segment(name))).await?;
        debug!("[FS_SCHEMA] Deleted schema '{}'", name);
        self.sync().await
    }
}

fn require_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FastSchemaError::invalid_argument("schema name is required"));
    }
    Ok(name)
}

/// One schema: definition accessors, content CRUD and realtime binding.
#[derive(Clone)]
pub struct Schema {
    data: SchemaData,
    transport: Transport,
    realtime: Realtime,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema").field("data", &self.data).finish()
    }
}

impl Schema {
    pub fn raw(&self) -> &SchemaData {
        &self.data
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn namespace(&self) -> &str {
        &self.data.namespace
    }

    pub fn label_field(&self) -> &str {
        &self.data.label_field
    }

    pub fn fields(&self) -> &[Field] {
        &self.data.fields
    }

    pub fn disable_timestamp(&self) -> bool {
        self.data.disable_timestamp
    }

    pub fn is_system_schema(&self) -> bool {
        self.data.is_system_schema
    }

    pub fn is_junction_schema(&self) -> bool {
        self.data.is_junction_schema
    }

    fn content_path(&self) -> String {
        format!("/content/{}", encode_path_segment(&self.data.name))
    }

    fn record_path(&self, id: &RecordId) -> String {
        format!(
            "{}/{}",
            self.content_path(),
            encode_path_segment(&id.to_string())
        )
    }

    /// `POST /content/<schema>`
    pub async fn create<T, B>(&self, data: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.transport.post(&self.content_path(), data).await
    }

    /// `PUT /content/<schema>/<id>`
    pub async fn update<T, B>(&self, id: impl Into<RecordId>, data: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.transport.put(&self.record_path(&id.into()), data).await
    }

    /// `DELETE /content/<schema>/<id>`
    pub async fn delete<T: DeserializeOwned>(&self, id: impl Into<RecordId>) -> Result<T> {
        self.transport.delete(&self.record_path(&id.into())).await
    }

    /// `GET /content/<schema>/<id>`
    pub async fn get<T: DeserializeOwned>(&self, id: impl Into<RecordId>) -> Result<T> {
        self.transport.get(&self.record_path(&id.into())).await
    }

    /// `GET /content/<schema>?limit=&page=&sort=&select=&filter=`
    pub async fn list<T: DeserializeOwned>(
        &self,
        options: Option<&ListOptions>,
    ) -> Result<Pagination<T>> {
        let query = content_filter_query(options)?;
        let path = if query.is_empty() {
            self.content_path()
        } else {
            format!("{}?{}", self.content_path(), query)
        };
        self.transport.get(&path).await
    }

    /// Subscribe to changes of this schema. See [`Realtime::subscribe`];
    /// handshake failures come back as `Err`, not through `callback`.
    pub async fn on<T>(
        &self,
        scope: impl Into<Scope>,
        callback: impl Into<Option<EventCallback<T>>>,
    ) -> Result<SubscriptionHandle>
    where
        T: DeserializeOwned + 'static,
    {
        self.realtime.subscribe(&self.data.name, scope, callback.into()).await
    }

    /// Remove this schema's subscriptions registered under `callback`. The
    /// same callback stays subscribed on other schemas.
    pub fn off<T>(&self, callback: &EventCallback<T>) -> usize {
        self.realtime.unsubscribe_from(&self.data.name, callback)
    }
}

/// The `file` schema plus uploads.
#[derive(Clone, Debug)]
pub struct FileSchema {
    schema: Schema,
}

impl FileSchema {
    pub(crate) fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Upload files through `POST /file/upload`.
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<UploadResult> {
        self.schema.transport.upload(files).await
    }
}
