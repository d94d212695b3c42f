pub mod frame;
pub mod ice;

pub use frame::{PixelFormat, VideoFrame};
pub use ice::{describe_transport_error, BundlePolicy, IceConfig, IceServer, IceTransportPolicy};
