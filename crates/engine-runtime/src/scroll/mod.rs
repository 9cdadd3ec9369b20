pub mod machine;
pub mod publisher;
pub mod stream;
pub mod subscriber;

pub use machine::{Command, Phase, ScrollEvent, ScrollMachine, Termination};
pub use publisher::{ScrollPublisher, ScrollSubscription};
pub use stream::ScrollStream;
pub use subscriber::{ChannelSubscriber, Signal, Subscriber};
