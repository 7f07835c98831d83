//! Opcode table, script parsing, and disassembly primitives.
//!
//! Every byte value has a table entry describing its printable name,
//! how many immediate bytes it carries, and whether it is executable,
//! disabled, reserved, or unassigned. The parser and the disassembler
//! are both driven off this table; the name strings are part of the
//! public contract.

use bitcoin::hex::DisplayHex;

use crate::ScriptError;

pub const OP_0: u8 = 0x00;
pub const OP_FALSE: u8 = 0x00;
pub const OP_DATA_1: u8 = 0x01;
pub const OP_DATA_2: u8 = 0x02;
pub const OP_DATA_3: u8 = 0x03;
pub const OP_DATA_4: u8 = 0x04;
pub const OP_DATA_5: u8 = 0x05;
pub const OP_DATA_6: u8 = 0x06;
pub const OP_DATA_7: u8 = 0x07;
pub const OP_DATA_8: u8 = 0x08;
pub const OP_DATA_9: u8 = 0x09;
pub const OP_DATA_10: u8 = 0x0a;
pub const OP_DATA_11: u8 = 0x0b;
pub const OP_DATA_12: u8 = 0x0c;
pub const OP_DATA_13: u8 = 0x0d;
pub const OP_DATA_14: u8 = 0x0e;
pub const OP_DATA_15: u8 = 0x0f;
pub const OP_DATA_16: u8 = 0x10;
pub const OP_DATA_17: u8 = 0x11;
pub const OP_DATA_18: u8 = 0x12;
pub const OP_DATA_19: u8 = 0x13;
pub const OP_DATA_20: u8 = 0x14;
pub const OP_DATA_21: u8 = 0x15;
pub const OP_DATA_22: u8 = 0x16;
pub const OP_DATA_23: u8 = 0x17;
pub const OP_DATA_24: u8 = 0x18;
pub const OP_DATA_25: u8 = 0x19;
pub const OP_DATA_26: u8 = 0x1a;
pub const OP_DATA_27: u8 = 0x1b;
pub const OP_DATA_28: u8 = 0x1c;
pub const OP_DATA_29: u8 = 0x1d;
pub const OP_DATA_30: u8 = 0x1e;
pub const OP_DATA_31: u8 = 0x1f;
pub const OP_DATA_32: u8 = 0x20;
pub const OP_DATA_33: u8 = 0x21;
pub const OP_DATA_34: u8 = 0x22;
pub const OP_DATA_35: u8 = 0x23;
pub const OP_DATA_36: u8 = 0x24;
pub const OP_DATA_37: u8 = 0x25;
pub const OP_DATA_38: u8 = 0x26;
pub const OP_DATA_39: u8 = 0x27;
pub const OP_DATA_40: u8 = 0x28;
pub const OP_DATA_41: u8 = 0x29;
pub const OP_DATA_42: u8 = 0x2a;
pub const OP_DATA_43: u8 = 0x2b;
pub const OP_DATA_44: u8 = 0x2c;
pub const OP_DATA_45: u8 = 0x2d;
pub const OP_DATA_46: u8 = 0x2e;
pub const OP_DATA_47: u8 = 0x2f;
pub const OP_DATA_48: u8 = 0x30;
pub const OP_DATA_49: u8 = 0x31;
pub const OP_DATA_50: u8 = 0x32;
pub const OP_DATA_51: u8 = 0x33;
pub const OP_DATA_52: u8 = 0x34;
pub const OP_DATA_53: u8 = 0x35;
pub const OP_DATA_54: u8 = 0x36;
pub const OP_DATA_55: u8 = 0x37;
pub const OP_DATA_56: u8 = 0x38;
pub const OP_DATA_57: u8 = 0x39;
pub const OP_DATA_58: u8 = 0x3a;
pub const OP_DATA_59: u8 = 0x3b;
pub const OP_DATA_60: u8 = 0x3c;
pub const OP_DATA_61: u8 = 0x3d;
pub const OP_DATA_62: u8 = 0x3e;
pub const OP_DATA_63: u8 = 0x3f;
pub const OP_DATA_64: u8 = 0x40;
pub const OP_DATA_65: u8 = 0x41;
pub const OP_DATA_66: u8 = 0x42;
pub const OP_DATA_67: u8 = 0x43;
pub const OP_DATA_68: u8 = 0x44;
pub const OP_DATA_69: u8 = 0x45;
pub const OP_DATA_70: u8 = 0x46;
pub const OP_DATA_71: u8 = 0x47;
pub const OP_DATA_72: u8 = 0x48;
pub const OP_DATA_73: u8 = 0x49;
pub const OP_DATA_74: u8 = 0x4a;
pub const OP_DATA_75: u8 = 0x4b;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_RESERVED: u8 = 0x50;
pub const OP_1: u8 = 0x51;
pub const OP_TRUE: u8 = 0x51;
pub const OP_2: u8 = 0x52;
pub const OP_3: u8 = 0x53;
pub const OP_4: u8 = 0x54;
pub const OP_5: u8 = 0x55;
pub const OP_6: u8 = 0x56;
pub const OP_7: u8 = 0x57;
pub const OP_8: u8 = 0x58;
pub const OP_9: u8 = 0x59;
pub const OP_10: u8 = 0x5a;
pub const OP_11: u8 = 0x5b;
pub const OP_12: u8 = 0x5c;
pub const OP_13: u8 = 0x5d;
pub const OP_14: u8 = 0x5e;
pub const OP_15: u8 = 0x5f;
pub const OP_16: u8 = 0x60;
pub const OP_NOP: u8 = 0x61;
pub const OP_VER: u8 = 0x62;
pub const OP_IF: u8 = 0x63;
pub const OP_NOTIF: u8 = 0x64;
pub const OP_VERIF: u8 = 0x65;
pub const OP_VERNOTIF: u8 = 0x66;
pub const OP_ELSE: u8 = 0x67;
pub const OP_ENDIF: u8 = 0x68;
pub const OP_VERIFY: u8 = 0x69;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_TOALTSTACK: u8 = 0x6b;
pub const OP_FROMALTSTACK: u8 = 0x6c;
pub const OP_2DROP: u8 = 0x6d;
pub const OP_2DUP: u8 = 0x6e;
pub const OP_3DUP: u8 = 0x6f;
pub const OP_2OVER: u8 = 0x70;
pub const OP_2ROT: u8 = 0x71;
pub const OP_2SWAP: u8 = 0x72;
pub const OP_IFDUP: u8 = 0x73;
pub const OP_DEPTH: u8 = 0x74;
pub const OP_DROP: u8 = 0x75;
pub const OP_DUP: u8 = 0x76;
pub const OP_NIP: u8 = 0x77;
pub const OP_OVER: u8 = 0x78;
pub const OP_PICK: u8 = 0x79;
pub const OP_ROLL: u8 = 0x7a;
pub const OP_ROT: u8 = 0x7b;
pub const OP_SWAP: u8 = 0x7c;
pub const OP_TUCK: u8 = 0x7d;
pub const OP_CAT: u8 = 0x7e;
pub const OP_SUBSTR: u8 = 0x7f;
pub const OP_LEFT: u8 = 0x80;
pub const OP_RIGHT: u8 = 0x81;
pub const OP_SIZE: u8 = 0x82;
pub const OP_INVERT: u8 = 0x83;
pub const OP_AND: u8 = 0x84;
pub const OP_OR: u8 = 0x85;
pub const OP_XOR: u8 = 0x86;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_RESERVED1: u8 = 0x89;
pub const OP_RESERVED2: u8 = 0x8a;
pub const OP_1ADD: u8 = 0x8b;
pub const OP_1SUB: u8 = 0x8c;
pub const OP_2MUL: u8 = 0x8d;
pub const OP_2DIV: u8 = 0x8e;
pub const OP_NEGATE: u8 = 0x8f;
pub const OP_ABS: u8 = 0x90;
pub const OP_NOT: u8 = 0x91;
pub const OP_0NOTEQUAL: u8 = 0x92;
pub const OP_ADD: u8 = 0x93;
pub const OP_SUB: u8 = 0x94;
pub const OP_MUL: u8 = 0x95;
pub const OP_DIV: u8 = 0x96;
pub const OP_MOD: u8 = 0x97;
pub const OP_LSHIFT: u8 = 0x98;
pub const OP_RSHIFT: u8 = 0x99;
pub const OP_BOOLAND: u8 = 0x9a;
pub const OP_BOOLOR: u8 = 0x9b;
pub const OP_NUMEQUAL: u8 = 0x9c;
pub const OP_NUMEQUALVERIFY: u8 = 0x9d;
pub const OP_NUMNOTEQUAL: u8 = 0x9e;
pub const OP_LESSTHAN: u8 = 0x9f;
pub const OP_GREATERTHAN: u8 = 0xa0;
pub const OP_LESSTHANOREQUAL: u8 = 0xa1;
pub const OP_GREATERTHANOREQUAL: u8 = 0xa2;
pub const OP_MIN: u8 = 0xa3;
pub const OP_MAX: u8 = 0xa4;
pub const OP_WITHIN: u8 = 0xa5;
pub const OP_RIPEMD160: u8 = 0xa6;
pub const OP_SHA1: u8 = 0xa7;
pub const OP_SHA256: u8 = 0xa8;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_HASH256: u8 = 0xaa;
pub const OP_CODESEPARATOR: u8 = 0xab;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;
pub const OP_NOP1: u8 = 0xb0;
pub const OP_NOP2: u8 = 0xb1;
pub const OP_NOP3: u8 = 0xb2;
pub const OP_NOP4: u8 = 0xb3;
pub const OP_NOP5: u8 = 0xb4;
pub const OP_NOP6: u8 = 0xb5;
pub const OP_NOP7: u8 = 0xb6;
pub const OP_NOP8: u8 = 0xb7;
pub const OP_NOP9: u8 = 0xb8;
pub const OP_NOP10: u8 = 0xb9;

/// How a table entry behaves when the interpreter reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeClass {
    /// Executable opcode with a handler in the engine.
    Normal,
    /// Fails the script whenever it appears, even in a skipped branch.
    Disabled,
    /// Fails the script if executed; inert in a skipped branch.
    Reserved,
    /// Unassigned byte value; fails if executed, refuses to disassemble.
    Invalid,
}

/// Static metadata for a single opcode byte.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    pub value: u8,
    pub name: &'static str,
    /// Positive `n`: the opcode occupies `n` script bytes, the opcode
    /// byte plus `n - 1` immediate data bytes. Negative `-1`/`-2`/`-4`:
    /// a little-endian length prefix of that width follows the opcode
    /// byte and gives the data length.
    pub length: i32,
    pub class: OpcodeClass,
}

const fn op(value: u8, name: &'static str, length: i32) -> OpcodeInfo {
    OpcodeInfo {
        value,
        name,
        length,
        class: OpcodeClass::Normal,
    }
}

const fn disabled(value: u8, name: &'static str) -> OpcodeInfo {
    OpcodeInfo {
        value,
        name,
        length: 1,
        class: OpcodeClass::Disabled,
    }
}

const fn reserved(value: u8, name: &'static str) -> OpcodeInfo {
    OpcodeInfo {
        value,
        name,
        length: 1,
        class: OpcodeClass::Reserved,
    }
}

const fn invalid(value: u8, name: &'static str) -> OpcodeInfo {
    OpcodeInfo {
        value,
        name,
        length: 1,
        class: OpcodeClass::Invalid,
    }
}

/// The full opcode map, indexed by byte value.
pub const OPCODE_TABLE: [OpcodeInfo; 256] = [
    op(OP_0, "OP_0", 1),
    op(OP_DATA_1, "OP_DATA_1", 2),
    op(OP_DATA_2, "OP_DATA_2", 3),
    op(OP_DATA_3, "OP_DATA_3", 4),
    op(OP_DATA_4, "OP_DATA_4", 5),
    op(OP_DATA_5, "OP_DATA_5", 6),
    op(OP_DATA_6, "OP_DATA_6", 7),
    op(OP_DATA_7, "OP_DATA_7", 8),
    op(OP_DATA_8, "OP_DATA_8", 9),
    op(OP_DATA_9, "OP_DATA_9", 10),
    op(OP_DATA_10, "OP_DATA_10", 11),
    op(OP_DATA_11, "OP_DATA_11", 12),
    op(OP_DATA_12, "OP_DATA_12", 13),
    op(OP_DATA_13, "OP_DATA_13", 14),
    op(OP_DATA_14, "OP_DATA_14", 15),
    op(OP_DATA_15, "OP_DATA_15", 16),
    op(OP_DATA_16, "OP_DATA_16", 17),
    op(OP_DATA_17, "OP_DATA_17", 18),
    op(OP_DATA_18, "OP_DATA_18", 19),
    op(OP_DATA_19, "OP_DATA_19", 20),
    op(OP_DATA_20, "OP_DATA_20", 21),
    op(OP_DATA_21, "OP_DATA_21", 22),
    op(OP_DATA_22, "OP_DATA_22", 23),
    op(OP_DATA_23, "OP_DATA_23", 24),
    op(OP_DATA_24, "OP_DATA_24", 25),
    op(OP_DATA_25, "OP_DATA_25", 26),
    op(OP_DATA_26, "OP_DATA_26", 27),
    op(OP_DATA_27, "OP_DATA_27", 28),
    op(OP_DATA_28, "OP_DATA_28", 29),
    op(OP_DATA_29, "OP_DATA_29", 30),
    op(OP_DATA_30, "OP_DATA_30", 31),
    op(OP_DATA_31, "OP_DATA_31", 32),
    op(OP_DATA_32, "OP_DATA_32", 33),
    op(OP_DATA_33, "OP_DATA_33", 34),
    op(OP_DATA_34, "OP_DATA_34", 35),
    op(OP_DATA_35, "OP_DATA_35", 36),
    op(OP_DATA_36, "OP_DATA_36", 37),
    op(OP_DATA_37, "OP_DATA_37", 38),
    op(OP_DATA_38, "OP_DATA_38", 39),
    op(OP_DATA_39, "OP_DATA_39", 40),
    op(OP_DATA_40, "OP_DATA_40", 41),
    op(OP_DATA_41, "OP_DATA_41", 42),
    op(OP_DATA_42, "OP_DATA_42", 43),
    op(OP_DATA_43, "OP_DATA_43", 44),
    op(OP_DATA_44, "OP_DATA_44", 45),
    op(OP_DATA_45, "OP_DATA_45", 46),
    op(OP_DATA_46, "OP_DATA_46", 47),
    op(OP_DATA_47, "OP_DATA_47", 48),
    op(OP_DATA_48, "OP_DATA_48", 49),
    op(OP_DATA_49, "OP_DATA_49", 50),
    op(OP_DATA_50, "OP_DATA_50", 51),
    op(OP_DATA_51, "OP_DATA_51", 52),
    op(OP_DATA_52, "OP_DATA_52", 53),
    op(OP_DATA_53, "OP_DATA_53", 54),
    op(OP_DATA_54, "OP_DATA_54", 55),
    op(OP_DATA_55, "OP_DATA_55", 56),
    op(OP_DATA_56, "OP_DATA_56", 57),
    op(OP_DATA_57, "OP_DATA_57", 58),
    op(OP_DATA_58, "OP_DATA_58", 59),
    op(OP_DATA_59, "OP_DATA_59", 60),
    op(OP_DATA_60, "OP_DATA_60", 61),
    op(OP_DATA_61, "OP_DATA_61", 62),
    op(OP_DATA_62, "OP_DATA_62", 63),
    op(OP_DATA_63, "OP_DATA_63", 64),
    op(OP_DATA_64, "OP_DATA_64", 65),
    op(OP_DATA_65, "OP_DATA_65", 66),
    op(OP_DATA_66, "OP_DATA_66", 67),
    op(OP_DATA_67, "OP_DATA_67", 68),
    op(OP_DATA_68, "OP_DATA_68", 69),
    op(OP_DATA_69, "OP_DATA_69", 70),
    op(OP_DATA_70, "OP_DATA_70", 71),
    op(OP_DATA_71, "OP_DATA_71", 72),
    op(OP_DATA_72, "OP_DATA_72", 73),
    op(OP_DATA_73, "OP_DATA_73", 74),
    op(OP_DATA_74, "OP_DATA_74", 75),
    op(OP_DATA_75, "OP_DATA_75", 76),
    op(OP_PUSHDATA1, "OP_PUSHDATA1", -1),
    op(OP_PUSHDATA2, "OP_PUSHDATA2", -2),
    op(OP_PUSHDATA4, "OP_PUSHDATA4", -4),
    op(OP_1NEGATE, "OP_1NEGATE", 1),
    reserved(OP_RESERVED, "OP_RESERVED"),
    op(OP_1, "OP_1", 1),
    op(OP_2, "OP_2", 1),
    op(OP_3, "OP_3", 1),
    op(OP_4, "OP_4", 1),
    op(OP_5, "OP_5", 1),
    op(OP_6, "OP_6", 1),
    op(OP_7, "OP_7", 1),
    op(OP_8, "OP_8", 1),
    op(OP_9, "OP_9", 1),
    op(OP_10, "OP_10", 1),
    op(OP_11, "OP_11", 1),
    op(OP_12, "OP_12", 1),
    op(OP_13, "OP_13", 1),
    op(OP_14, "OP_14", 1),
    op(OP_15, "OP_15", 1),
    op(OP_16, "OP_16", 1),
    op(OP_NOP, "OP_NOP", 1),
    reserved(OP_VER, "OP_VER"),
    op(OP_IF, "OP_IF", 1),
    op(OP_NOTIF, "OP_NOTIF", 1),
    reserved(OP_VERIF, "OP_VERIF"),
    reserved(OP_VERNOTIF, "OP_VERNOTIF"),
    op(OP_ELSE, "OP_ELSE", 1),
    op(OP_ENDIF, "OP_ENDIF", 1),
    op(OP_VERIFY, "OP_VERIFY", 1),
    op(OP_RETURN, "OP_RETURN", 1),
    op(OP_TOALTSTACK, "OP_TOALTSTACK", 1),
    op(OP_FROMALTSTACK, "OP_FROMALTSTACK", 1),
    op(OP_2DROP, "OP_2DROP", 1),
    op(OP_2DUP, "OP_2DUP", 1),
    op(OP_3DUP, "OP_3DUP", 1),
    op(OP_2OVER, "OP_2OVER", 1),
    op(OP_2ROT, "OP_2ROT", 1),
    op(OP_2SWAP, "OP_2SWAP", 1),
    op(OP_IFDUP, "OP_IFDUP", 1),
    op(OP_DEPTH, "OP_DEPTH", 1),
    op(OP_DROP, "OP_DROP", 1),
    op(OP_DUP, "OP_DUP", 1),
    op(OP_NIP, "OP_NIP", 1),
    op(OP_OVER, "OP_OVER", 1),
    op(OP_PICK, "OP_PICK", 1),
    op(OP_ROLL, "OP_ROLL", 1),
    op(OP_ROT, "OP_ROT", 1),
    op(OP_SWAP, "OP_SWAP", 1),
    op(OP_TUCK, "OP_TUCK", 1),
    disabled(OP_CAT, "OP_CAT"),
    disabled(OP_SUBSTR, "OP_SUBSTR"),
    disabled(OP_LEFT, "OP_LEFT"),
    disabled(OP_RIGHT, "OP_RIGHT"),
    op(OP_SIZE, "OP_SIZE", 1),
    disabled(OP_INVERT, "OP_INVERT"),
    disabled(OP_AND, "OP_AND"),
    disabled(OP_OR, "OP_OR"),
    disabled(OP_XOR, "OP_XOR"),
    op(OP_EQUAL, "OP_EQUAL", 1),
    op(OP_EQUALVERIFY, "OP_EQUALVERIFY", 1),
    reserved(OP_RESERVED1, "OP_RESERVED1"),
    reserved(OP_RESERVED2, "OP_RESERVED2"),
    op(OP_1ADD, "OP_1ADD", 1),
    op(OP_1SUB, "OP_1SUB", 1),
    disabled(OP_2MUL, "OP_2MUL"),
    disabled(OP_2DIV, "OP_2DIV"),
    op(OP_NEGATE, "OP_NEGATE", 1),
    op(OP_ABS, "OP_ABS", 1),
    op(OP_NOT, "OP_NOT", 1),
    op(OP_0NOTEQUAL, "OP_0NOTEQUAL", 1),
    op(OP_ADD, "OP_ADD", 1),
    op(OP_SUB, "OP_SUB", 1),
    disabled(OP_MUL, "OP_MUL"),
    disabled(OP_DIV, "OP_DIV"),
    disabled(OP_MOD, "OP_MOD"),
    disabled(OP_LSHIFT, "OP_LSHIFT"),
    disabled(OP_RSHIFT, "OP_RSHIFT"),
    op(OP_BOOLAND, "OP_BOOLAND", 1),
    op(OP_BOOLOR, "OP_BOOLOR", 1),
    op(OP_NUMEQUAL, "OP_NUMEQUAL", 1),
    op(OP_NUMEQUALVERIFY, "OP_NUMEQUALVERIFY", 1),
    op(OP_NUMNOTEQUAL, "OP_NUMNOTEQUAL", 1),
    op(OP_LESSTHAN, "OP_LESSTHAN", 1),
    op(OP_GREATERTHAN, "OP_GREATERTHAN", 1),
    op(OP_LESSTHANOREQUAL, "OP_LESSTHANOREQUAL", 1),
    op(OP_GREATERTHANOREQUAL, "OP_GREATERTHANOREQUAL", 1),
    op(OP_MIN, "OP_MIN", 1),
    op(OP_MAX, "OP_MAX", 1),
    op(OP_WITHIN, "OP_WITHIN", 1),
    op(OP_RIPEMD160, "OP_RIPEMD160", 1),
    op(OP_SHA1, "OP_SHA1", 1),
    op(OP_SHA256, "OP_SHA256", 1),
    op(OP_HASH160, "OP_HASH160", 1),
    op(OP_HASH256, "OP_HASH256", 1),
    op(OP_CODESEPARATOR, "OP_CODESEPARATOR", 1),
    op(OP_CHECKSIG, "OP_CHECKSIG", 1),
    op(OP_CHECKSIGVERIFY, "OP_CHECKSIGVERIFY", 1),
    op(OP_CHECKMULTISIG, "OP_CHECKMULTISIG", 1),
    op(OP_CHECKMULTISIGVERIFY, "OP_CHECKMULTISIGVERIFY", 1),
    op(OP_NOP1, "OP_NOP1", 1),
    op(OP_NOP2, "OP_NOP2", 1),
    op(OP_NOP3, "OP_NOP3", 1),
    op(OP_NOP4, "OP_NOP4", 1),
    op(OP_NOP5, "OP_NOP5", 1),
    op(OP_NOP6, "OP_NOP6", 1),
    op(OP_NOP7, "OP_NOP7", 1),
    op(OP_NOP8, "OP_NOP8", 1),
    op(OP_NOP9, "OP_NOP9", 1),
    op(OP_NOP10, "OP_NOP10", 1),
    invalid(0xba, "OP_UNKNOWN186"),
    invalid(0xbb, "OP_UNKNOWN187"),
    invalid(0xbc, "OP_UNKNOWN188"),
    invalid(0xbd, "OP_UNKNOWN189"),
    invalid(0xbe, "OP_UNKNOWN190"),
    invalid(0xbf, "OP_UNKNOWN191"),
    invalid(0xc0, "OP_UNKNOWN192"),
    invalid(0xc1, "OP_UNKNOWN193"),
    invalid(0xc2, "OP_UNKNOWN194"),
    invalid(0xc3, "OP_UNKNOWN195"),
    invalid(0xc4, "OP_UNKNOWN196"),
    invalid(0xc5, "OP_UNKNOWN197"),
    invalid(0xc6, "OP_UNKNOWN198"),
    invalid(0xc7, "OP_UNKNOWN199"),
    invalid(0xc8, "OP_UNKNOWN200"),
    invalid(0xc9, "OP_UNKNOWN201"),
    invalid(0xca, "OP_UNKNOWN202"),
    invalid(0xcb, "OP_UNKNOWN203"),
    invalid(0xcc, "OP_UNKNOWN204"),
    invalid(0xcd, "OP_UNKNOWN205"),
    invalid(0xce, "OP_UNKNOWN206"),
    invalid(0xcf, "OP_UNKNOWN207"),
    invalid(0xd0, "OP_UNKNOWN208"),
    invalid(0xd1, "OP_UNKNOWN209"),
    invalid(0xd2, "OP_UNKNOWN210"),
    invalid(0xd3, "OP_UNKNOWN211"),
    invalid(0xd4, "OP_UNKNOWN212"),
    invalid(0xd5, "OP_UNKNOWN213"),
    invalid(0xd6, "OP_UNKNOWN214"),
    invalid(0xd7, "OP_UNKNOWN215"),
    invalid(0xd8, "OP_UNKNOWN216"),
    invalid(0xd9, "OP_UNKNOWN217"),
    invalid(0xda, "OP_UNKNOWN218"),
    invalid(0xdb, "OP_UNKNOWN219"),
    invalid(0xdc, "OP_UNKNOWN220"),
    invalid(0xdd, "OP_UNKNOWN221"),
    invalid(0xde, "OP_UNKNOWN222"),
    invalid(0xdf, "OP_UNKNOWN223"),
    invalid(0xe0, "OP_UNKNOWN224"),
    invalid(0xe1, "OP_UNKNOWN225"),
    invalid(0xe2, "OP_UNKNOWN226"),
    invalid(0xe3, "OP_UNKNOWN227"),
    invalid(0xe4, "OP_UNKNOWN228"),
    invalid(0xe5, "OP_UNKNOWN229"),
    invalid(0xe6, "OP_UNKNOWN230"),
    invalid(0xe7, "OP_UNKNOWN231"),
    invalid(0xe8, "OP_UNKNOWN232"),
    invalid(0xe9, "OP_UNKNOWN233"),
    invalid(0xea, "OP_UNKNOWN234"),
    invalid(0xeb, "OP_UNKNOWN235"),
    invalid(0xec, "OP_UNKNOWN236"),
    invalid(0xed, "OP_UNKNOWN237"),
    invalid(0xee, "OP_UNKNOWN238"),
    invalid(0xef, "OP_UNKNOWN239"),
    invalid(0xf0, "OP_UNKNOWN240"),
    invalid(0xf1, "OP_UNKNOWN241"),
    invalid(0xf2, "OP_UNKNOWN242"),
    invalid(0xf3, "OP_UNKNOWN243"),
    invalid(0xf4, "OP_UNKNOWN244"),
    invalid(0xf5, "OP_UNKNOWN245"),
    invalid(0xf6, "OP_UNKNOWN246"),
    invalid(0xf7, "OP_UNKNOWN247"),
    invalid(0xf8, "OP_UNKNOWN248"),
    invalid(0xf9, "OP_UNKNOWN249"),
    invalid(0xfa, "OP_UNKNOWN250"),
    invalid(0xfb, "OP_UNKNOWN251"),
    invalid(0xfc, "OP_UNKNOWN252"),
    invalid(0xfd, "OP_UNKNOWN253"),
    invalid(0xfe, "OP_UNKNOWN254"),
    invalid(0xff, "OP_UNKNOWN255"),
];

/// An opcode together with its immediate data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOpcode {
    pub value: u8,
    pub data: Vec<u8>,
}

impl ParsedOpcode {
    /// Table entry for this opcode.
    pub fn info(&self) -> &'static OpcodeInfo {
        &OPCODE_TABLE[self.value as usize]
    }

    /// True for the opcodes whose sole effect is pushing immediate data.
    pub fn is_data_push(&self) -> bool {
        (OP_DATA_1..=OP_PUSHDATA4).contains(&self.value)
    }

    /// Renders the opcode for disassembly: the payload in lowercase hex
    /// for data pushes, the table name otherwise.
    pub fn disasm(&self) -> Result<String, ScriptError> {
        let info = self.info();
        if info.class == OpcodeClass::Invalid {
            return Err(ScriptError::InvalidOpcode);
        }
        if self.is_data_push() {
            Ok(self.data.to_lower_hex_string())
        } else {
            Ok(info.name.to_owned())
        }
    }

    /// Appends the opcode in its original wire form. The opcode byte
    /// fully determines the length encoding, so a parse followed by
    /// serialization reproduces the input bytes exactly, including
    /// non-minimal push encodings.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.value);
        match self.info().length {
            1 => {}
            len if len > 1 => buf.extend_from_slice(&self.data),
            prefix => {
                let width = prefix.unsigned_abs() as usize;
                let len_bytes = (self.data.len() as u32).to_le_bytes();
                buf.extend_from_slice(&len_bytes[..width]);
                buf.extend_from_slice(&self.data);
            }
        }
    }
}

/// Decodes a raw byte script into its ordered opcode sequence.
///
/// Legality is not checked here: disabled, reserved, and unassigned
/// opcodes parse fine and fail later, at execution time. The only
/// parse failure is a declared immediate length running past the end
/// of the script.
pub fn parse_script(script: &[u8]) -> Result<Vec<ParsedOpcode>, ScriptError> {
    let mut pops = Vec::new();
    let mut offset = 0usize;

    while offset < script.len() {
        let value = script[offset];
        let info = &OPCODE_TABLE[value as usize];
        offset += 1;

        match info.length {
            1 => pops.push(ParsedOpcode {
                value,
                data: Vec::new(),
            }),
            len if len > 1 => {
                let data_len = len as usize - 1;
                if script.len() - offset < data_len {
                    return Err(ScriptError::ShortScript);
                }
                pops.push(ParsedOpcode {
                    value,
                    data: script[offset..offset + data_len].to_vec(),
                });
                offset += data_len;
            }
            prefix => {
                let width = prefix.unsigned_abs() as usize;
                if script.len() - offset < width {
                    return Err(ScriptError::ShortScript);
                }
                let mut data_len = 0usize;
                for (i, &byte) in script[offset..offset + width].iter().enumerate() {
                    data_len |= (byte as usize) << (8 * i);
                }
                offset += width;
                if script.len() - offset < data_len {
                    return Err(ScriptError::ShortScript);
                }
                pops.push(ParsedOpcode {
                    value,
                    data: script[offset..offset + data_len].to_vec(),
                });
                offset += data_len;
            }
        }
    }

    Ok(pops)
}

/// Re-serializes a parsed opcode sequence into wire bytes.
pub fn serialize_script(pops: &[ParsedOpcode]) -> Vec<u8> {
    let mut buf = Vec::new();
    for pop in pops {
        pop.serialize_into(&mut buf);
    }
    buf
}

/// Drops every occurrence of `value` from the sequence.
pub(crate) fn remove_opcode(pops: Vec<ParsedOpcode>, value: u8) -> Vec<ParsedOpcode> {
    pops.into_iter().filter(|pop| pop.value != value).collect()
}

/// Drops every data push whose payload equals `data`. Matching is on
/// the parsed payload, so the push's length encoding is irrelevant.
pub(crate) fn remove_opcode_by_data(pops: Vec<ParsedOpcode>, data: &[u8]) -> Vec<ParsedOpcode> {
    pops.into_iter()
        .filter(|pop| !(pop.is_data_push() && pop.data == data))
        .collect()
}

/// True when every opcode only pushes data (numeric constants count
/// as pushes).
pub(crate) fn is_push_only(pops: &[ParsedOpcode]) -> bool {
    pops.iter().all(|pop| pop.value <= OP_16)
}

/// Recognizes the pay-to-script-hash pattern
/// `OP_HASH160 <20-byte hash> OP_EQUAL`.
pub(crate) fn is_script_hash(pops: &[ParsedOpcode]) -> bool {
    pops.len() == 3
        && pops[0].value == OP_HASH160
        && pops[1].value == OP_DATA_20
        && pops[2].value == OP_EQUAL
}
