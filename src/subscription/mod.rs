pub mod protocol;
pub mod session;
pub mod supervisor;
pub mod transport;

pub use protocol::{build_service_filter, decode_frame, Frame, ResumeWindow, SubscribeRequest};
pub use session::{ConnectError, Session, SessionState, StreamError, CLOSE_TIMEOUT, CONNECT_TIMEOUT};
pub use supervisor::{StreamSupervisor, SupervisorError, RESUME_LIMIT, RESUME_LOOKBACK_SECS};
pub use transport::{Connector, Transport, TransportError, WsConnector, DEFAULT_SUBSCRIPTION_URL};
