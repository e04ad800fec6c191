/// The `BaseStore` contract shared by every backend.
pub mod base_store;
/// Lock-striped backend.
pub mod striped;
/// Single-lock backend.
pub mod synchronized;
