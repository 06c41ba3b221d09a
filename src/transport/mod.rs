//! Network transports: the multicast control channel and the broadcast
//! status notifier

pub mod multicast;
pub mod notifier;

pub use multicast::{dispatch, DatagramSink, MulticastListener, PacketContext, MAX_TRIGGER_LEN};
pub use notifier::{MulticastNotifier, Notifier};
