//! Compiled-in point schema and channel keymap for a single-phase PV inverter.

use crate::keymap::KeyMapEntry;
use crate::point::{PointKind, PointSpec};

use PointKind::{Decimal, Text, UnsignedInteger as Unsigned};

pub const PROCESS_NAME: &str = "venus-sma-net";
pub const PROCESS_VERSION: u32 = 1;
pub const PROCESS_VERSION_TEXT: &str = "1.0.0";

pub const DEFAULT_SCHEMA: &[PointSpec] = &[
    PointSpec::text("/Mgmt/ProcessName", Text, 0.0, PROCESS_NAME),
    PointSpec::text(
        "/Mgmt/ProcessVersion",
        Unsigned,
        PROCESS_VERSION as f64,
        PROCESS_VERSION_TEXT,
    ),
    PointSpec::text("/Mgmt/Connection", Text, 0.0, "RS485-SMANet"),
    PointSpec::text("/DeviceInstance", Unsigned, 1.0, "1"),
    PointSpec::text("/ProductId", Unsigned, 65535.0, "0xffff"),
    PointSpec::text("/ProductName", Text, 0.0, "YASDI SMAnet device"),
    PointSpec::text("/CustomName", Text, 0.0, "SMA 3800"),
    PointSpec::text("/FirmwareVersion", Text, 0.0, PROCESS_VERSION_TEXT),
    PointSpec::number("/Serial", Unsigned, 0.0),
    PointSpec::number("/Connected", Unsigned, 1.0),
    PointSpec::number("/Latency", Unsigned, 0.0),
    PointSpec::number("/ErrorCode", Unsigned, 0.0),
    PointSpec::number("/Position", Unsigned, 0.0),
    PointSpec::number("/StatusCode", Unsigned, 0.0),
    PointSpec::number("/Pv/0/V", Decimal, 0.0),
    PointSpec::number("/NrOfPhases", Unsigned, 1.0),
    PointSpec::number("/NrOfTrackers", Unsigned, 1.0),
    PointSpec::number("/Ac/Frequency", Decimal, 0.0),
    PointSpec::number("/Ac/L1/Power", Unsigned, 0.0),
    PointSpec::number("/Ac/L1/Current", Decimal, 0.0),
    PointSpec::number("/Ac/L1/Voltage", Decimal, 0.0),
    PointSpec::number("/Ac/L1/Energy/Forward", Unsigned, 0.0),
    PointSpec::number("/Ac/Energy/Forward", Unsigned, 0.0),
    PointSpec::number("/Ac/Power", Unsigned, 0.0),
    PointSpec::number("/Ac/MaxPower", Unsigned, 3800.0),
    PointSpec::number("/Ac/Position", Unsigned, 0.0),
    PointSpec::number("/UpdateIndex", Unsigned, 0.0),
];

/// Registry path fed by each provider channel. A channel may appear several times.
pub const DEFAULT_KEYMAP: &[KeyMapEntry] = &[
    KeyMapEntry::new("/Ac/L1/Voltage", "Uac"),
    KeyMapEntry::new("/Ac/L1/Current", "Iac-Ist"),
    KeyMapEntry::new("/Ac/L1/Power", "Pac"),
    KeyMapEntry::new("/Ac/Power", "Pac"),
    KeyMapEntry::new("/Ac/Frequency", "Fac"),
    KeyMapEntry::new("/Pv/0/V", "Upv-Soll"),
    KeyMapEntry::new("/Ac/Energy/Forward", "E-Total"),
    KeyMapEntry::new("/Ac/L1/Energy/Forward", "E-Total"),
    KeyMapEntry::new("/Ac/MaxPower", "Plimit"),
    KeyMapEntry::new("/FirmwareVersion", "Software-BFR"),
    KeyMapEntry::new("/Serial", "Seriennummer"),
    // Stop/Offset/Warten/Mpp
    KeyMapEntry::new("/StatusCode", "Status"),
];
