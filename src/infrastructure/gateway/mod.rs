pub mod registry;

pub use registry::{
    ConnectionRegistry, ConnectionSnapshot, Liveness, Outbound, OutboundSender,
};
