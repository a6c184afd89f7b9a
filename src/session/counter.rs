use serde::{Deserialize, Serialize};
use tracing::trace;
use zeroize::Zeroize;

use super::{Error, Result};

pub const COUNTER_LEN: usize = 16;
pub const TOP_HALF_LEN: usize = 8;

/// Which bytes of the 16-byte counter block take part in an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CounterLayout {
    /// The whole block is one big-endian counter.
    #[default]
    Full,
    /// Only the top eight bytes count messages. The bottom eight stay zero
    /// and are left to the block counter of the stream cipher. Data messages
    /// carry just the top half on the wire.
    TopHalf,
}

impl CounterLayout {
    #[inline]
    fn live_len(self) -> usize {
        match self {
            CounterLayout::Full => COUNTER_LEN,
            CounterLayout::TopHalf => TOP_HALF_LEN,
        }
    }
}

/// Sending and receiving counters of one key binding.
#[derive(Clone, PartialEq, Eq)]
pub struct NonceCounters {
    layout: CounterLayout,
    sending: [u8; COUNTER_LEN],
    receiving: [u8; COUNTER_LEN],
}

impl NonceCounters {
    pub fn new(layout: CounterLayout) -> Self {
        Self {
            layout,
            sending: [0; COUNTER_LEN],
            receiving: [0; COUNTER_LEN],
        }
    }

    #[inline]
    pub fn layout(&self) -> CounterLayout {
        self.layout
    }

    /// Adds one to the sending counter. Wraps to zero silently.
    pub fn increment_sending(&mut self) {
        increment(&mut self.sending[..self.layout.live_len()]);
        trace!("sending counter incremented");
    }

    #[inline]
    pub fn sending(&self) -> &[u8; COUNTER_LEN] {
        &self.sending
    }

    #[inline]
    pub fn receiving(&self) -> &[u8; COUNTER_LEN] {
        &self.receiving
    }

    /// Overwrites the receiving counter. Only the length is checked; callers
    /// must make sure a counter is never reused under the same key.
    pub fn set_receiving(&mut self, counter: &[u8]) -> Result<()> {
        self.receiving = counter
            .try_into()
            .map_err(|_| Error::InvalidCounterLength(counter.len()))?;
        Ok(())
    }

    /// The top half of the sending counter, as carried in a data message.
    #[inline]
    pub fn sending_top_half(&self) -> [u8; TOP_HALF_LEN] {
        let mut top = [0u8; TOP_HALF_LEN];
        top.copy_from_slice(&self.sending[..TOP_HALF_LEN]);
        top
    }

    /// Resynchronizes the receiving counter from the top half carried in a
    /// data message. The bottom half is zeroed.
    pub fn set_receiving_top_half(&mut self, top: [u8; TOP_HALF_LEN]) {
        self.receiving = [0; COUNTER_LEN];
        self.receiving[..TOP_HALF_LEN].copy_from_slice(&top);
    }

    pub fn reset(&mut self) {
        self.sending.zeroize();
        self.receiving.zeroize();
    }
}

impl Default for NonceCounters {
    fn default() -> Self {
        Self::new(CounterLayout::default())
    }
}

impl std::fmt::Debug for NonceCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceCounters")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Big-endian increment with carry toward index 0.
#[inline]
fn increment(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}
