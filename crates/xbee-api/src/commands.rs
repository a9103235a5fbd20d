//! AT command table.
//!
//! Every two-character configuration mnemonic the modules understand, with its
//! numeric code and the shape of its parameter. The table is immutable data; the
//! only operations are lookups.

use std::fmt;

use crate::constants::AT_COMMAND_LENGTH;
use crate::error::{ProtocolError, ProtocolResult};

/// Functional group a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    /// Module and destination addressing.
    Addressing,
    /// Network formation and discovery.
    Networking,
    /// Encryption settings.
    Security,
    /// Radio power, channel and rate.
    RfInterfacing,
    /// UART and API mode.
    SerialInterfacing,
    /// Digital and analog pin configuration.
    IoSettings,
    /// Read-only status values.
    Diagnostics,
    /// Command mode behavior.
    CommandOptions,
    /// Sleep configuration.
    Sleep,
    /// Actions executed immediately.
    Execution,
}

impl CommandCategory {
    /// Human-readable name.
    pub const fn as_str(self) -> &'static str {
        match self {
            CommandCategory::Addressing => "addressing",
            CommandCategory::Networking => "networking",
            CommandCategory::Security => "security",
            CommandCategory::RfInterfacing => "rf interfacing",
            CommandCategory::SerialInterfacing => "serial interfacing",
            CommandCategory::IoSettings => "i/o settings",
            CommandCategory::Diagnostics => "diagnostics",
            CommandCategory::CommandOptions => "command options",
            CommandCategory::Sleep => "sleep",
            CommandCategory::Execution => "execution",
        }
    }
}

/// What a command accepts as a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterShape {
    /// Query only; any parameter is rejected.
    ReadOnly,
    /// Big-endian numeric value of at most `max_len` bytes.
    Numeric {
        /// Maximum width in bytes.
        max_len: usize,
    },
    /// Byte or string value of at most `max_len` bytes.
    Variable {
        /// Maximum length in bytes.
        max_len: usize,
    },
    /// Action with no parameter.
    Execute,
}

impl ParameterShape {
    /// Longest parameter accepted, zero for read-only and execute commands.
    pub const fn max_len(self) -> usize {
        match self {
            ParameterShape::ReadOnly | ParameterShape::Execute => 0,
            ParameterShape::Numeric { max_len } | ParameterShape::Variable { max_len } => max_len,
        }
    }
}

/// One row of the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtCommandDescriptor {
    /// The two mnemonic bytes.
    pub mnemonic: [u8; AT_COMMAND_LENGTH],
    /// Mnemonic bytes read as a big-endian integer.
    pub code: u16,
    /// Functional group.
    pub category: CommandCategory,
    /// Parameter shape.
    pub shape: ParameterShape,
    /// Short description.
    pub description: &'static str,
}

impl AtCommandDescriptor {
    const fn new(
        mnemonic: &[u8; 2],
        category: CommandCategory,
        shape: ParameterShape,
        description: &'static str,
    ) -> Self {
        AtCommandDescriptor {
            mnemonic: *mnemonic,
            code: u16::from_be_bytes(*mnemonic),
            category,
            shape,
            description,
        }
    }

    /// Mnemonic as a string slice.
    pub fn name(&self) -> &str {
        // Every table entry is ASCII
        std::str::from_utf8(&self.mnemonic).unwrap_or("??")
    }

    /// Whether the command can only be queried.
    pub fn is_read_only(&self) -> bool {
        self.shape == ParameterShape::ReadOnly
    }

    /// Check that `parameter` is acceptable for this command.
    ///
    /// An empty parameter is always accepted: it queries a setting or runs an action.
    pub fn validate_parameter(&self, parameter: &[u8]) -> ProtocolResult<()> {
        if parameter.is_empty() {
            return Ok(());
        }
        match self.shape {
            ParameterShape::ReadOnly => Err(ProtocolError::ReadOnlyCommand(self.name().to_string())),
            shape if parameter.len() > shape.max_len() => Err(ProtocolError::ParameterTooLong {
                command: self.name().to_string(),
                max: shape.max_len(),
                actual: parameter.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for AtCommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AT{} ({})", self.name(), self.description)
    }
}

use CommandCategory::*;
use ParameterShape::*;

const fn num(max_len: usize) -> ParameterShape {
    Numeric { max_len }
}

const fn var(max_len: usize) -> ParameterShape {
    Variable { max_len }
}

const fn at(
    mnemonic: &[u8; 2],
    category: CommandCategory,
    shape: ParameterShape,
    description: &'static str,
) -> AtCommandDescriptor {
    AtCommandDescriptor::new(mnemonic, category, shape, description)
}

/// Every known AT command.
pub static COMMANDS: &[AtCommandDescriptor] = &[
    // ========================================================================
    // Addressing
    // ========================================================================
    at(b"DH", Addressing, num(4), "Destination address high"),
    at(b"DL", Addressing, num(4), "Destination address low"),
    at(b"ZA", Addressing, num(1), "Application layer addressing"),
    at(b"SE", Addressing, num(1), "Source endpoint"),
    at(b"CI", Addressing, num(2), "Cluster identifier"),
    at(b"BI", Addressing, num(1), "Binding table index"),
    at(b"MY", Addressing, num(4), "Address of local module"),
    at(b"MP", Addressing, ReadOnly, "Parent network address"),
    at(b"MK", Addressing, num(4), "Network mask"),
    at(b"GW", Addressing, num(4), "Gateway IP address"),
    at(b"SH", Addressing, ReadOnly, "Serial number high 32 bits"),
    at(b"SL", Addressing, ReadOnly, "Serial number low 32 bits"),
    at(b"NI", Addressing, var(20), "Node identifier"),
    at(b"DE", Addressing, num(2), "Destination port or endpoint"),
    at(b"C0", Addressing, num(2), "Serial communication service port"),
    at(b"DD", Addressing, num(4), "Device type"),
    at(b"NP", Addressing, ReadOnly, "Maximum RF payload bytes"),
    // ========================================================================
    // Networking
    // ========================================================================
    at(b"BH", Networking, num(1), "Maximum broadcast hops"),
    at(b"NT", Networking, num(1), "Node discover timeout"),
    at(b"ND", Networking, var(20), "Node discover"),
    at(b"DN", Networking, var(20), "Destination node"),
    at(b"JN", Networking, num(1), "Join notification"),
    at(b"SC", Networking, num(2), "Scan channels"),
    at(b"SD", Networking, num(1), "Scan duration"),
    at(b"NJ", Networking, num(1), "Node join time"),
    at(b"AR", Networking, num(1), "Aggregate routing notification"),
    at(b"ID", Networking, var(31), "SSID or PAN ID"),
    at(b"AH", Networking, num(1), "Network type"),
    at(b"IP", Networking, num(1), "IP protocol"),
    at(b"MA", Networking, num(1), "IP addressing mode"),
    at(b"TM", Networking, num(2), "TCP timeout"),
    // ========================================================================
    // Security
    // ========================================================================
    at(b"EE", Security, num(1), "Encryption enable"),
    at(b"PK", Security, var(64), "Security key"),
    // ========================================================================
    // RF interfacing
    // ========================================================================
    at(b"PM", RfInterfacing, num(1), "Power mode"),
    at(b"PL", RfInterfacing, num(1), "Power level"),
    at(b"CH", RfInterfacing, num(1), "Operating channel"),
    at(b"BR", RfInterfacing, num(1), "Bit rate of IBSS creator"),
    // ========================================================================
    // Serial interfacing
    // ========================================================================
    at(b"AP", SerialInterfacing, num(1), "API mode"),
    at(b"AO", SerialInterfacing, num(1), "API options"),
    at(b"BD", SerialInterfacing, num(4), "Interface data rate"),
    at(b"NB", SerialInterfacing, num(1), "UART parity"),
    at(b"SB", SerialInterfacing, num(1), "UART stop bits"),
    at(b"RO", SerialInterfacing, num(1), "Packetization timeout"),
    at(b"FT", SerialInterfacing, num(2), "Flow control threshold"),
    at(b"D7", SerialInterfacing, num(1), "DIO7 configuration"),
    at(b"D6", SerialInterfacing, num(1), "DIO6 configuration"),
    // ========================================================================
    // I/O settings
    // ========================================================================
    at(b"IR", IoSettings, num(2), "IO sample rate"),
    at(b"IC", IoSettings, num(2), "IO digital change detection"),
    at(b"IF", IoSettings, num(1), "Samples from sleep rate"),
    at(b"P0", IoSettings, num(1), "PWM0/DIO10 configuration"),
    at(b"P1", IoSettings, num(1), "DIO11 configuration"),
    at(b"P2", IoSettings, num(1), "DIO12 configuration"),
    at(b"D0", IoSettings, num(1), "AD0/DIO0 configuration"),
    at(b"D1", IoSettings, num(1), "AD1/DIO1 configuration"),
    at(b"D2", IoSettings, num(1), "AD2/DIO2 configuration"),
    at(b"D3", IoSettings, num(1), "AD3/DIO3 configuration"),
    at(b"D4", IoSettings, num(1), "DIO4 configuration"),
    at(b"D5", IoSettings, num(1), "DIO5 configuration"),
    at(b"D8", IoSettings, num(1), "DIO8/SLEEP_RQ configuration"),
    at(b"D9", IoSettings, num(1), "DIO9/ON_SLEEP configuration"),
    at(b"LT", IoSettings, num(1), "Associate LED blink time"),
    at(b"PR", IoSettings, num(2), "Pull-up resistors"),
    at(b"RP", IoSettings, num(1), "RSSI PWM timer"),
    at(b"IS", IoSettings, Execute, "Force sample"),
    // ========================================================================
    // Diagnostics
    // ========================================================================
    at(b"VR", Diagnostics, ReadOnly, "Firmware version"),
    at(b"HV", Diagnostics, ReadOnly, "Hardware version"),
    at(b"AI", Diagnostics, ReadOnly, "Association indication"),
    at(b"AS", Diagnostics, Execute, "Active scan"),
    at(b"TP", Diagnostics, ReadOnly, "Module temperature"),
    at(b"CK", Diagnostics, ReadOnly, "Configuration code"),
    at(b"%V", Diagnostics, ReadOnly, "Supply voltage"),
    // ========================================================================
    // Command mode options
    // ========================================================================
    at(b"CT", CommandOptions, num(2), "Command mode timeout"),
    at(b"CN", CommandOptions, Execute, "Exit command mode"),
    at(b"GT", CommandOptions, num(2), "Guard times"),
    at(b"CC", CommandOptions, num(1), "Command sequence character"),
    // ========================================================================
    // Sleep
    // ========================================================================
    at(b"SM", Sleep, num(1), "Sleep mode"),
    at(b"SP", Sleep, num(2), "Sleep period"),
    at(b"SN", Sleep, num(2), "Number of sleep periods"),
    at(b"SO", Sleep, num(2), "Sleep options"),
    at(b"WH", Sleep, num(2), "Wake host timer"),
    at(b"ST", Sleep, num(2), "Time before sleep"),
    // ========================================================================
    // Execution
    // ========================================================================
    at(b"AC", Execution, Execute, "Apply changes"),
    at(b"WR", Execution, Execute, "Write settings to non-volatile memory"),
    at(b"WB", Execution, Execute, "Write binding table"),
    at(b"RE", Execution, Execute, "Restore defaults"),
    at(b"FR", Execution, Execute, "Software reset"),
    at(b"NR", Execution, num(1), "Network reset"),
];

/// Find a command by its mnemonic, case-sensitively.
pub fn lookup(mnemonic: &str) -> Option<&'static AtCommandDescriptor> {
    let bytes = mnemonic.as_bytes();
    if bytes.len() != AT_COMMAND_LENGTH {
        return None;
    }
    COMMANDS.iter().find(|c| c.mnemonic == bytes)
}

/// Find a command by its numeric code.
pub fn lookup_code(code: u16) -> Option<&'static AtCommandDescriptor> {
    COMMANDS.iter().find(|c| c.code == code)
}

/// Find a command by mnemonic, failing with [`ProtocolError::UnknownCommand`].
pub fn require(mnemonic: &str) -> ProtocolResult<&'static AtCommandDescriptor> {
    lookup(mnemonic).ok_or_else(|| ProtocolError::UnknownCommand(mnemonic.to_string()))
}

/// Iterate the commands of one category.
pub fn by_category(category: CommandCategory) -> impl Iterator<Item = &'static AtCommandDescriptor> {
    COMMANDS.iter().filter(move |c| c.category == category)
}
