use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::net::index_vec::Idx;

static NEXT_NET_ID: AtomicU32 = AtomicU32::new(0);

/// Tag shared by a [`Net`](crate::net::Net) and every handle it hands out.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NetId(u32);

impl NetId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_NET_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetId({})", self.0)
    }
}

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            net: NetId,
            raw: u32,
        }

        impl $name {
            pub(crate) const fn new(net: NetId, raw: u32) -> Self {
                Self { net, raw }
            }

            pub const fn net(self) -> NetId {
                self.net
            }

            pub const fn raw(self) -> u32 {
                self.raw
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, stringify!($name))?;
                f.debug_tuple("").field(&self.net.0).field(&self.raw).finish()
            }
        }

        impl Idx for $name {
            fn index(self) -> usize {
                self.raw as usize
            }
        }
    };
}

define_id!(PlaceId);
define_id!(TransitionId);
