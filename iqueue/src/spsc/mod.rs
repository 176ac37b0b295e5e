pub mod generic;
pub mod indirect;

pub use generic::GenericQueue;
pub use indirect::IndirectQueue;
