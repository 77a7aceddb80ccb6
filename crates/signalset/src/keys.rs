//! Wire key names used in signalset JSON.

pub const COMMANDS: &str = "commands";
pub const SIGNALS: &str = "signals";

// Command properties with a known meaning. Everything else is carried opaquely.
pub const HEADER: &str = "hdr";
pub const RECEIVE_ADDRESS: &str = "rax";
pub const EXTENDED_ADDRESS: &str = "eax";
pub const TESTER_ADDRESS: &str = "tst";
pub const FREQUENCY: &str = "freq";
pub const FLOW_CONTROL: &str = "fcm1";
pub const COMMAND_CODE: &str = "cmd";

pub const ID: &str = "id";
pub const PATH: &str = "path";
pub const FORMAT: &str = "fmt";
pub const NAME: &str = "name";
pub const SUGGESTED_METRIC: &str = "suggestedMetric";

pub const BIT_OFFSET: &str = "bix";
pub const BIT_LENGTH: &str = "len";
pub const UNIT: &str = "unit";
pub const MINIMUM: &str = "min";
pub const MAXIMUM: &str = "max";
pub const ADDITIVE_OFFSET: &str = "add";
pub const MULTIPLIER: &str = "mul";
pub const DIVISOR: &str = "div";
