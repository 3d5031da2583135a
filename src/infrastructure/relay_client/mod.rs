pub mod backoff;
pub mod connection;
pub mod probe;
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use connection::{ConnectionState, RelayConnection};
pub use probe::HttpGatewayProbe;
pub use transport::{GatewayProbe, RelayTransport};
