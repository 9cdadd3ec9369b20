pub mod actor;
pub mod messages;
pub mod scroll;
pub mod spawn;

pub use actor::{Actor, ActorContext, ActorRef};
pub use spawn::spawn_actor;
