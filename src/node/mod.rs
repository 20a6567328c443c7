mod node;
mod server;

pub use node::*;
pub use server::*;
