pub mod compute;
pub mod object_store;
