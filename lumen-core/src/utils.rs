pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Path of the signaling WebSocket endpoint on the relay.
pub const SIGNALING_PATH: &str = "/ws";
