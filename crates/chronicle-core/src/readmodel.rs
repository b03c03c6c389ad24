//! Readmodel abstractions and the repository seam.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::codec;
use crate::error::DomainError;

/// A denormalized view keyed by the identifier of the aggregate it describes.
pub trait Readmodel: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Stable type tag stored with the payload.
    const READMODEL_TYPE: &'static str;

    /// Returns the key the readmodel is stored under.
    fn id(&self) -> Uuid;
}

/// A readmodel as it is stored: key, type tag and encoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadmodelRecord {
    /// Primary key.
    pub aggregate_id: Uuid,
    /// Tag of the readmodel type the payload decodes to.
    pub readmodel_type: String,
    /// Encoded readmodel.
    pub data: Value,
}

impl ReadmodelRecord {
    /// Encodes `readmodel` into a record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the readmodel cannot be encoded.
    pub fn encode<T: Readmodel>(readmodel: &T) -> Result<Self, DomainError> {
        Ok(Self {
            aggregate_id: readmodel.id(),
            readmodel_type: T::READMODEL_TYPE.to_owned(),
            data: codec::encode(readmodel)?,
        })
    }

    /// Decodes the record as `T`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the record was written for
    /// another readmodel type or the payload does not decode.
    pub fn decode<T: Readmodel>(&self) -> Result<T, DomainError> {
        if self.readmodel_type != T::READMODEL_TYPE {
            return Err(DomainError::Serialization(format!(
                "readmodel {} is a {}, not a {}",
                self.aggregate_id,
                self.readmodel_type,
                T::READMODEL_TYPE
            )));
        }
        codec::decode(&self.data)
    }
}

/// Keyed storage for readmodels.
///
/// Every call round-trips to the backing storage; implementations do not
/// cache.
#[async_trait]
pub trait ReadmodelRepository: Send + Sync {
    /// Inserts the record, or fully replaces the one stored under the same key.
    async fn save_record(&self, record: ReadmodelRecord) -> Result<(), DomainError>;

    /// Loads the record stored under `aggregate_id`, if any.
    async fn load_record(&self, aggregate_id: Uuid)
    -> Result<Option<ReadmodelRecord>, DomainError>;

    /// Removes the record stored under `aggregate_id`. Removing an absent key
    /// succeeds.
    async fn delete(&self, aggregate_id: Uuid) -> Result<(), DomainError>;
}

/// Typed access on top of any [`ReadmodelRepository`].
#[async_trait]
pub trait ReadmodelRepositoryExt: ReadmodelRepository {
    /// Upserts `readmodel` under [`Readmodel::id`].
    async fn save<T: Readmodel>(&self, readmodel: &T) -> Result<(), DomainError> {
        let record = ReadmodelRecord::encode(readmodel)?;
        self.save_record(record).await
    }

    /// Loads the readmodel stored under `aggregate_id` as `T`.
    ///
    /// Returns `Ok(None)` when nothing is stored.
    async fn load<T: Readmodel>(&self, aggregate_id: Uuid) -> Result<Option<T>, DomainError> {
        self.load_record(aggregate_id)
            .await?
            .map(|record| record.decode::<T>())
            .transpose()
    }
}

impl<R: ReadmodelRepository + ?Sized> ReadmodelRepositoryExt for R {}
