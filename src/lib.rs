//! Stack-machine interpreter for Bitcoin transaction scripts.
//!
//! Given the signature script attached to a transaction input and the
//! public-key script of the output it spends, the [`Engine`] decides
//! whether the spend is authorized. Evaluation reproduces the legacy
//! consensus rules bit for bit: the dual data/alt stack machine, the
//! nested conditional structure, the canonical script-number encoding,
//! the per-script resource limits, and the historical signature-hash
//! construction (including its well-known warts).
//!
//! Evaluation is a pure function of its inputs: the same scripts,
//! transaction, and input index always produce the same outcome, and
//! every failure is one of the [`ScriptError`] kinds below. Invalid
//! signatures and malformed public keys are *not* errors; they evaluate
//! to a false stack entry, as consensus requires.

pub mod opcodes;
mod script;
pub mod sighash;
mod stack;

pub use opcodes::{parse_script, serialize_script, OpcodeClass, OpcodeInfo, ParsedOpcode, OPCODE_TABLE};
pub use script::Engine;
pub use stack::{as_bool, encode_num, parse_num, Stack};

use core::fmt;

use bitcoin::Transaction;

/// Failure reasons surfaced by script parsing and evaluation.
///
/// The set is closed and the variants are stable: callers (and the test
/// suite) match on them to distinguish structurally invalid scripts
/// from scripts that merely evaluate to false.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The parser ran past the end of the script.
    ShortScript,
    /// An opcode marked as unassigned was executed.
    InvalidOpcode,
    /// A disabled opcode was encountered, even inside a skipped branch.
    OpDisabled,
    /// A reserved opcode was executed.
    ReservedOpcode,
    /// A stack operation found insufficient items.
    Underflow,
    /// A stack manipulator was invoked with a non-positive count.
    InvalidArgs,
    /// An integer decode exceeded the permitted byte length.
    NumberTooBig,
    /// CHECKMULTISIG declared a key count outside 1..=20.
    TooManyPubkeys,
    /// A VERIFY-class opcode consumed a false value.
    VerifyFailed,
    /// The final stack was empty or its top entry was false.
    EvalFalse,
    /// ELSE or ENDIF without a matching IF/NOTIF.
    NoIf,
    /// IF/NOTIF without a matching ENDIF.
    MissingEndif,
    /// OP_RETURN was executed.
    EarlyReturn,
    /// A script exceeded 10000 bytes.
    ScriptTooLarge,
    /// Combined data + alt stack depth exceeded 1000 entries.
    StackOverflow,
    /// A pushed byte string exceeded 520 bytes.
    ItemTooLarge,
    /// More than 201 non-push opcodes executed in one script.
    TooManyOps,
    /// A pay-to-script-hash signature script contained non-push opcodes.
    NonPushOnly,
    /// The referenced transaction input or script slot does not exist.
    InvalidIndex,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ScriptError::*;

        let description = match *self {
            ShortScript => "opcode declares more immediate bytes than the script holds",
            InvalidOpcode => "unassigned opcode executed",
            OpDisabled => "disabled opcode encountered",
            ReservedOpcode => "reserved opcode executed",
            Underflow => "stack underflow",
            InvalidArgs => "stack operation called with an invalid count",
            NumberTooBig => "numeric value exceeds the permitted byte length",
            TooManyPubkeys => "multisig key count outside 1..=20",
            VerifyFailed => "verify opcode consumed a false value",
            EvalFalse => "script evaluated without error but finished false",
            NoIf => "else or endif without a matching if",
            MissingEndif => "if without a matching endif",
            EarlyReturn => "script returned early",
            ScriptTooLarge => "script exceeds the maximum script size",
            StackOverflow => "combined stack depth exceeds the limit",
            ItemTooLarge => "stack entry exceeds the maximum element size",
            TooManyOps => "script exceeds the operation limit",
            NonPushOnly => "pay-to-script-hash signature script is not push only",
            InvalidIndex => "transaction input or script index out of range",
        };

        f.write_str(description)
    }
}

impl std::error::Error for ScriptError {}

/// Renders a raw script as a single line of space-separated opcode
/// names and hex-encoded push payloads.
///
/// Parse failures and unassigned opcodes are returned as errors rather
/// than rendered.
pub fn disasm(script: &[u8]) -> Result<String, ScriptError> {
    let pops = parse_script(script)?;
    let rendered = pops
        .iter()
        .map(ParsedOpcode::disasm)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rendered.join(" "))
}

/// Verifies a single spend end to end: constructs an [`Engine`] and
/// runs it to completion, including the final stack check.
pub fn verify_spend(
    sig_script: &[u8],
    pk_script: &[u8],
    input_idx: usize,
    tx: Transaction,
    input_amount: i64,
    p2sh_enabled: bool,
) -> Result<(), ScriptError> {
    let mut engine = Engine::new(
        sig_script,
        pk_script,
        input_idx,
        tx,
        input_amount,
        p2sh_enabled,
    )?;
    engine.execute()
}
