pub mod chain;
pub mod contracts;
pub mod payload;
pub mod registry;
pub mod route_resolver;

#[cfg(test)]
pub(crate) mod mock;
