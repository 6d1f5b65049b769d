//! Proxmox VE SDN wire types
//!
//! Request and response bodies of the `cluster/sdn/zones` API together with
//! the encodings Proxmox uses on the wire.

pub mod codec;
pub mod error;
pub mod sdn;

pub use codec::{join_list, split_list};
pub use error::{SharedResult, SharedTypeError};
pub use sdn::{ZoneGetResponseBody, ZoneListResponseBody, ZoneRecord, ZoneType, ZoneUpdateRequest};
