pub mod ledger;
pub mod position;
pub mod registry;
pub mod route;
pub mod units;

pub use ledger::{LedgerEntry, PositionStatus};
pub use position::{
    ClosePositionParams, ClosePreview, OpenPositionParams, OpenPreview, PipelineStage, TxOutcome,
    TxReceipt,
};
pub use registry::{ContractRegistry, ContractRole, RegistryEntry};
pub use route::{Asset, Hop, RouteQuote, RouteRequest};
