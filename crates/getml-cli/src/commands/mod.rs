pub mod dataset;
pub mod dispatch;
pub mod engine;
pub mod frame;
pub mod model;
pub mod project;
pub mod schema;
