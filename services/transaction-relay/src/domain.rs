// Domain layer modules
pub mod inbound_notification;
pub mod outbound_transaction;

// Re-exports
pub use inbound_notification::{InboundNotification, NamedParty, PartyField, TransactionData};
pub use outbound_transaction::{
    map_transaction, scale_amount, MappingError, OutboundTransaction, TransactionEnvelope,
    AMOUNT_MULTIPLIER, CLEARED_STATE,
};
