//! snaprecode-plan: turns a snapshot bundle into a restore plan
//!
//! Per brigade, in order:
//! ```text
//! EncryptedBrigade ──decode──▶ Brigade ──place──▶ slot
//!                                 │
//!                     sanitize ─▶ recode (reseal to router) ─▶ encode
//!                                                                │
//!                                              PreparedSnapshot ◀┘
//! ```
//! Bundle-level validation and the capacity check run before any secret is
//! decrypted; see [`pipeline`].

pub mod decode;
pub mod encode;
pub mod pipeline;
pub mod placement;
pub mod recode;
pub mod sanitize;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use decode::decode_brigade;
pub use encode::{encode_brigade, open_prepared, SnapshotEncoder};
pub use pipeline::{check_in, create_mapping, create_restore_plan, RecodeKeys, RunOptions};
pub use placement::{build_plan, CheckedPins, PlacementMode, PlanOptions, SlotEncoder, Topology};
pub use recode::{recode_brigade, RouterResealer, SecretResealer};
pub use sanitize::sanitize;
