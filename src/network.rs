pub mod interface;

pub use interface::{InterfaceId, interface_code};
