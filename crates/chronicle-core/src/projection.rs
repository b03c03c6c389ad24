//! Projections from event streams to readmodels.

use tracing::instrument;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::readmodel::{Readmodel, ReadmodelRepository, ReadmodelRepositoryExt};
use crate::store::EventStore;
use crate::stream::EventStream;

/// A pure fold of events into an optional readmodel.
///
/// `apply` receives `None` until a creating event has produced a readmodel.
/// Implementations ignore updates that arrive before that, and return the
/// input unchanged for events they do not handle.
pub trait Projection: Send + Sync {
    /// The readmodel this projection builds.
    type Readmodel: Readmodel;

    /// Folds one event into the readmodel.
    fn apply(
        &self,
        readmodel: Option<Self::Readmodel>,
        event: &dyn DomainEvent,
    ) -> Option<Self::Readmodel>;

    /// Folds the whole stream, starting from no readmodel.
    fn project(&self, stream: &EventStream) -> Option<Self::Readmodel> {
        stream.replay_with(None, |readmodel, event| self.apply(readmodel, event))
    }
}

/// Rebuilds the readmodel of `aggregate_id` from its event stream and stores
/// the result.
///
/// When the stream produces no readmodel the stored one is deleted.
///
/// # Errors
///
/// Returns any error from loading the stream or writing the readmodel.
#[instrument(skip(projection, store, repository), err)]
pub async fn refresh_readmodel<P>(
    projection: &P,
    aggregate_id: Uuid,
    store: &dyn EventStore,
    repository: &dyn ReadmodelRepository,
) -> Result<Option<P::Readmodel>, DomainError>
where
    P: Projection + ?Sized,
{
    let stream = store.load_stream(aggregate_id).await?;
    match projection.project(&stream) {
        Some(readmodel) => {
            repository.save(&readmodel).await?;
            Ok(Some(readmodel))
        }
        None => {
            repository.delete(aggregate_id).await?;
            Ok(None)
        }
    }
}
