pub mod channel;
pub mod local;
pub mod protocol;
pub mod substrate;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use channel::{ChannelSettings, CorrelationChannel, PORT_NAME};
pub use local::{LocalHost, Lifecycle};
pub use protocol::{Action, CorrelationId, Outcome, Request, Response, RewritePayload};
pub use substrate::{DeliveryError, MessageSubstrate, Port};

/// How the correlation channel reaches the privileged context.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum TransportStrategy {
    /// One duplex port per call, closed once the call resolves.
    #[default]
    #[strum(to_string = "port")]
    Port,
    /// Single request/reply delivery with a bounded re-send.
    #[strum(to_string = "one_shot", serialize = "one-shot")]
    OneShot,
}
