//! Snowflake ids: 42 bits of milliseconds since an epoch, 5 bits worker id,
//! 5 bits process id and a 12 bit rolling increment.

use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
};
use thiserror::Error;
use time::{Duration, UtcDateTime};

pub const TIMESTAMP_OFFSET: u32 = 22;
pub const TIMESTAMP_BITS: u32 = 42;
pub const WORKER_ID_OFFSET: u32 = 17;
pub const PROCESS_ID_OFFSET: u32 = 12;
pub const MACHINE_ID_BITS: u32 = 5;
pub const INCREMENT_BITS: u32 = 12;

const fn mask(bits: u32) -> u64 {
    (1 << bits) - 1
}

pub trait Epoch {
    const EPOCH_TIME: UtcDateTime;
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum SnowflakeTimeError {
    #[error("Specified time was before the snowflake epoch.")]
    BeforeEpoch,
    #[error("Specified time does not fit into the timestamp bits.")]
    TooLate,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Machine id {0} does not fit into {MACHINE_ID_BITS} bits")]
pub struct MachineIdOutOfRangeError(u8);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
pub struct MachineId(u8);

pub type WorkerId = MachineId;
pub type ProcessId = MachineId;

impl MachineId {
    pub fn new(id: u8) -> Result<Self, MachineIdOutOfRangeError> {
        if u64::from(id) <= mask(MACHINE_ID_BITS) {
            Ok(Self(id))
        } else {
            Err(MachineIdOutOfRangeError(id))
        }
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MachineId {
    type Error = MachineIdOutOfRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for MachineId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let inner = u8::deserialize(deserializer)?;
        Self::new(inner).map_err(serde::de::Error::custom)
    }
}

#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Snowflake<SnowflakeEpoch>(u64, #[serde(skip)] PhantomData<SnowflakeEpoch>);

impl<SnowflakeEpoch> Snowflake<SnowflakeEpoch> {
    #[must_use]
    pub fn new(inner: u64) -> Self {
        Self(inner, PhantomData)
    }

    pub fn from_parts(
        time: UtcDateTime,
        worker_id: WorkerId,
        process_id: ProcessId,
        increment: u16,
    ) -> Result<Self, SnowflakeTimeError>
    where
        SnowflakeEpoch: Epoch,
    {
        let millis = (time - SnowflakeEpoch::EPOCH_TIME).whole_milliseconds();
        let millis = u64::try_from(millis).map_err(|_| SnowflakeTimeError::BeforeEpoch)?;
        if millis > mask(TIMESTAMP_BITS) {
            return Err(SnowflakeTimeError::TooLate);
        }

        Ok(Self::new(
            millis << TIMESTAMP_OFFSET
                | u64::from(worker_id.get()) << WORKER_ID_OFFSET
                | u64::from(process_id.get()) << PROCESS_ID_OFFSET
                | (u64::from(increment) & mask(INCREMENT_BITS)),
        ))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn time(self) -> UtcDateTime
    where
        SnowflakeEpoch: Epoch,
    {
        let millis = self.0 >> TIMESTAMP_OFFSET;
        // 42 bits always fit into i64
        SnowflakeEpoch::EPOCH_TIME + Duration::milliseconds(millis.cast_signed())
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn worker_id(self) -> WorkerId {
        MachineId(((self.0 >> WORKER_ID_OFFSET) & mask(MACHINE_ID_BITS)) as u8)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn process_id(self) -> ProcessId {
        MachineId(((self.0 >> PROCESS_ID_OFFSET) & mask(MACHINE_ID_BITS)) as u8)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn increment(self) -> u16 {
        (self.0 & mask(INCREMENT_BITS)) as u16
    }
}

impl<SnowflakeEpoch> Display for Snowflake<SnowflakeEpoch> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<SnowflakeEpoch> From<u64> for Snowflake<SnowflakeEpoch> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

#[derive_where(Clone, Eq, PartialEq, Debug, Hash)]
pub struct SnowflakeGenerator<SnowflakeEpoch> {
    worker_id: WorkerId,
    process_id: ProcessId,
    next_increment: u16,
    last_time: Option<UtcDateTime>,
    phantom_data: PhantomData<SnowflakeEpoch>,
}

impl<SnowflakeEpoch: Epoch> SnowflakeGenerator<SnowflakeEpoch> {
    #[must_use]
    pub fn new(worker_id: WorkerId, process_id: ProcessId) -> Self {
        Self {
            worker_id,
            process_id,
            next_increment: 0,
            last_time: None,
            phantom_data: PhantomData,
        }
    }

    /// Generates an id for `time`. If the clock runs backwards the timestamp
    /// is held at the last seen value, so ids of one generator keep increasing.
    pub fn generate_at(
        &mut self,
        time: UtcDateTime,
    ) -> Result<Snowflake<SnowflakeEpoch>, SnowflakeTimeError> {
        let time = match self.last_time {
            Some(last) if last > time => last,
            _ => time,
        };

        let increment = self.next_increment;
        let next = (increment + 1) & 0x0FFF;
        self.next_increment = next;
        self.last_time = Some(if next == 0 {
            // increment space exhausted for this millisecond
            time + Duration::milliseconds(1)
        } else {
            time
        });

        Snowflake::from_parts(time, self.worker_id, self.process_id, increment)
    }

    pub fn generate(&mut self) -> Result<Snowflake<SnowflakeEpoch>, SnowflakeTimeError> {
        self.generate_at(UtcDateTime::now())
    }
}
