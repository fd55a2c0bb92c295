use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    dao::{
        models::{SnapshotEntity, SnapshotEnvelope},
        snapshot_store::{SnapshotStore, StoreHealth},
        storage::StorageResult,
    },
    state::now_epoch_ms,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchSnapshotDocument, snapshot_doc_id},
};

const MODE: &str = "couchdb";

/// Remote durable backend storing one document per session PIN.
///
/// TTL semantics are carried inside the document: expiry is stamped on
/// save and checked on load, so an expired document reads as absent even
/// though CouchDB itself never deletes it.
#[derive(Clone)]
pub struct CouchSnapshotStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
    key_prefix: Arc<str>,
    ttl_ms: i64,
}

impl CouchSnapshotStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig, key_prefix: &str, ttl_ms: i64) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
            key_prefix: Arc::from(key_prefix),
            ttl_ms,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn doc_id(&self, pin: &str) -> String {
        snapshot_doc_id(&self.key_prefix, pin)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);
        let mut builder = self.client.get(&url);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
        }

        let response = builder
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let mut builder = self.client.put(&url);
                if let Some((ref user, ref pass)) = self.auth {
                    builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
                }
                let create =
                    builder
                        .send()
                        .await
                        .map_err(|source| CouchDaoError::DatabaseCreate {
                            database: database.clone(),
                            source,
                        })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn delete_document(&self, doc_id: &str) -> CouchResult<()> {
        // CouchDB deletes need the current revision; an absent document is fine.
        let Some(existing) = self.get_document::<CouchSnapshotDocument>(doc_id).await? else {
            return Ok(());
        };
        let Some(rev) = existing.rev else {
            return Ok(());
        };

        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }
}

impl SnapshotStore for CouchSnapshotStore {
    fn save(&self, pin: &str, snapshot: SnapshotEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let doc_id = self.doc_id(pin);
        Box::pin(async move {
            let mut doc = CouchSnapshotDocument {
                id: doc_id.clone(),
                rev: None,
                envelope: SnapshotEnvelope::wrap(snapshot, now_epoch_ms(), store.ttl_ms),
            };
            if let Some(existing) = store.get_document::<CouchSnapshotDocument>(&doc_id).await? {
                doc.rev = existing.rev;
            }
            store.put_document(&doc_id, &doc).await.map_err(Into::into)
        })
    }

    fn load(&self, pin: &str) -> BoxFuture<'static, StorageResult<Option<SnapshotEntity>>> {
        let store = self.clone();
        let doc_id = self.doc_id(pin);
        Box::pin(async move {
            let maybe_doc = store.get_document::<CouchSnapshotDocument>(&doc_id).await?;
            Ok(maybe_doc
                .filter(|doc| !doc.envelope.is_expired(now_epoch_ms()))
                .map(|doc| doc.envelope.snapshot))
        })
    }

    fn delete(&self, pin: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let doc_id = self.doc_id(pin);
        Box::pin(async move { store.delete_document(&doc_id).await.map_err(Into::into) })
    }

    fn ping(&self) -> BoxFuture<'static, StoreHealth> {
        let store = self.clone();
        Box::pin(async move {
            match store.ensure_database().await {
                Ok(()) => StoreHealth::ok(MODE),
                Err(err) => StoreHealth::failed(MODE, err.to_string()),
            }
        })
    }

    fn mode(&self) -> &'static str {
        MODE
    }
}
