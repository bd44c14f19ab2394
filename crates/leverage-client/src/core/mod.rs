pub mod ledger_reader;
pub mod orchestrator;
pub mod slippage;
