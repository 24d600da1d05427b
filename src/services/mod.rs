// Outbound bridge pipeline, leaves first
pub mod resolver;
pub mod payload;
pub mod dedup;
pub mod transport;
pub mod audit;
pub mod dispatcher;

// Runtime parameter store
pub mod settings;

// Order lifecycle and read surface
pub mod production_orders;
pub mod work_orders;
