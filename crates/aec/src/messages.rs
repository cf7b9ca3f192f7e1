//! Control and response message shapes for [`crate::BlockProcessor`]'s
//! bounded SPSC channels.

use crate::config::ConfigDelta;
use crate::metrics::AggregateMetrics;

/// Inbound control messages, drained at the top of every block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMessage {
    /// Resume processing; echo cancellation is applied from the next block.
    Start,
    /// Suspend processing; the capture path keeps flowing as an identity
    /// passthrough.
    Stop,
    /// Clear all DSP state without changing configuration.
    Reset,
    /// Request an immediate [`Response::Metrics`] push.
    GetMetrics,
    /// Apply a live-tunable configuration delta, effective next block.
    SetConfig(ConfigDelta),
}

/// Outbound responses, enqueued to the metrics channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    /// Acknowledges a [`ControlMessage::Start`].
    Started,
    /// Acknowledges a [`ControlMessage::Stop`].
    Stopped,
    /// A metrics push, either cadence-driven or in response to
    /// [`ControlMessage::GetMetrics`].
    Metrics(AggregateMetrics),
}
