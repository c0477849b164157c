pub mod dimensions;
pub mod system;
pub mod trade;
