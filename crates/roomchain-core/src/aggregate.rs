//! Aggregate root and command abstractions.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots that record the events their commands produce.
///
/// The chain is not event sourced: state is mutated in place and the
/// recorded events describe the side effects the application layer must
/// carry out.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (number of events drained so far).
    fn version(&self) -> i64;

    /// Returns events recorded since the last drain.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Removes and returns the recorded events, advancing the version.
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event>;
}

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command, used as a log field.
    fn command_type(&self) -> &'static str;

    /// Correlation ID carried onto every event the command produces.
    fn correlation_id(&self) -> Uuid;
}
