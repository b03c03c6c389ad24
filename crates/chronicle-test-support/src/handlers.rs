//! Example command, query and event handlers.

use std::sync::Arc;

use async_trait::async_trait;
use chronicle_bus::{CommandHandler, EventHandler, HandlerRegistry, QueryHandler};
use chronicle_core::{
    AggregateRoot, Command, DomainError, EventStore, EventStream, Query, ReadmodelRepository,
    ReadmodelRepositoryExt, refresh_readmodel,
};
use uuid::Uuid;

use crate::example::{
    ExampleAggregate, ExampleCreated, ExampleNameChanged, ExampleProjection, ExampleReadmodel,
};

/// A command whose handler answers with the text it was given.
#[derive(Debug, Clone)]
pub struct EchoCommand(pub String);

impl Command for EchoCommand {
    type Response = String;
}

/// Handles [`EchoCommand`].
#[derive(Debug)]
pub struct EchoHandler;

#[async_trait]
impl CommandHandler<EchoCommand> for EchoHandler {
    async fn handle(&self, command: EchoCommand) -> Result<String, DomainError> {
        Ok(command.0)
    }
}

/// Creates an example aggregate.
#[derive(Debug, Clone)]
pub struct CreateExample {
    pub id: Uuid,
    pub name: String,
}

impl Command for CreateExample {
    type Response = ();
}

/// Handles [`CreateExample`].
#[derive(Clone)]
pub struct CreateExampleHandler {
    pub store: Arc<dyn EventStore>,
}

#[async_trait]
impl CommandHandler<CreateExample> for CreateExampleHandler {
    async fn handle(&self, command: CreateExample) -> Result<(), DomainError> {
        let aggregate = ExampleAggregate::create(command.id, command.name);
        let stream = EventStream::create(command.id).append(aggregate.uncommitted_events());
        self.store.save_stream(&stream).await
    }
}

/// Renames an existing example aggregate.
#[derive(Debug, Clone)]
pub struct RenameExample {
    pub id: Uuid,
    pub new_name: String,
}

impl Command for RenameExample {
    type Response = ();
}

/// Handles [`RenameExample`]: load, replay, rename, save the new events.
#[derive(Clone)]
pub struct RenameExampleHandler {
    pub store: Arc<dyn EventStore>,
}

#[async_trait]
impl CommandHandler<RenameExample> for RenameExampleHandler {
    async fn handle(&self, command: RenameExample) -> Result<(), DomainError> {
        let history = self.store.load_stream(command.id).await?;
        if history.is_empty() {
            return Err(DomainError::Validation(format!(
                "example {} does not exist",
                command.id
            )));
        }
        let aggregate: ExampleAggregate = history.replay();
        let renamed = aggregate.change_name(command.new_name)?;
        let stream = EventStream::create(command.id).append(renamed.uncommitted_events());
        self.store.save_stream(&stream).await
    }
}

/// Reads the readmodel of an example aggregate.
#[derive(Debug, Clone, Copy)]
pub struct GetExample {
    pub id: Uuid,
}

impl Query for GetExample {
    type Response = Option<ExampleReadmodel>;
}

/// Handles [`GetExample`].
#[derive(Clone)]
pub struct GetExampleHandler {
    pub readmodels: Arc<dyn ReadmodelRepository>,
}

#[async_trait]
impl QueryHandler<GetExample> for GetExampleHandler {
    async fn handle(&self, query: GetExample) -> Result<Option<ExampleReadmodel>, DomainError> {
        self.readmodels.load::<ExampleReadmodel>(query.id).await
    }
}

/// Keeps [`ExampleReadmodel`] in step with the event stream.
#[derive(Clone)]
pub struct ExampleReadmodelUpdater {
    pub store: Arc<dyn EventStore>,
    pub readmodels: Arc<dyn ReadmodelRepository>,
}

impl ExampleReadmodelUpdater {
    async fn refresh(&self, aggregate_id: Uuid) -> Result<(), DomainError> {
        refresh_readmodel(
            &ExampleProjection,
            aggregate_id,
            self.store.as_ref(),
            self.readmodels.as_ref(),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl EventHandler<ExampleCreated> for ExampleReadmodelUpdater {
    async fn handle(&self, event: &ExampleCreated) -> Result<(), DomainError> {
        self.refresh(event.aggregate_id).await
    }
}

#[async_trait]
impl EventHandler<ExampleNameChanged> for ExampleReadmodelUpdater {
    async fn handle(&self, event: &ExampleNameChanged) -> Result<(), DomainError> {
        self.refresh(event.aggregate_id).await
    }
}

/// Registers every example handler.
///
/// # Errors
///
/// Never fails in practice; each message type is registered once.
pub fn example_handlers(
    store: &Arc<dyn EventStore>,
    readmodels: &Arc<dyn ReadmodelRepository>,
) -> Result<HandlerRegistry, DomainError> {
    let updater = ExampleReadmodelUpdater {
        store: Arc::clone(store),
        readmodels: Arc::clone(readmodels),
    };
    let mut registry = HandlerRegistry::new();
    registry
        .register_command::<EchoCommand, _>(EchoHandler)?
        .register_command::<CreateExample, _>(CreateExampleHandler {
            store: Arc::clone(store),
        })?
        .register_command::<RenameExample, _>(RenameExampleHandler {
            store: Arc::clone(store),
        })?
        .register_query::<GetExample, _>(GetExampleHandler {
            readmodels: Arc::clone(readmodels),
        })?
        .subscribe::<ExampleCreated, _>(updater.clone())
        .subscribe::<ExampleNameChanged, _>(updater);
    Ok(registry)
}
