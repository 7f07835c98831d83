//! Script execution engine.
//!
//! An [`Engine`] evaluates a signature script followed by the
//! public-key script it unlocks, one opcode at a time, over a shared
//! pair of data and alt stacks. Pay-to-script-hash spends add a third
//! script slot holding the redeem script recovered from the signature
//! script's pushes.

use std::sync::OnceLock;

use bitcoin::{
    hashes::{hash160, ripemd160, sha1, sha256, sha256d, Hash},
    secp256k1::{ecdsa::Signature as EcdsaSignature, Message, PublicKey, Secp256k1, VerifyOnly},
    Transaction,
};

use crate::opcodes::*;
use crate::sighash::signature_hash;
use crate::stack::{as_bool, Stack, MAX_SCRIPT_ELEMENT_SIZE, SCRIPTNUM_MAX_LEN};
use crate::ScriptError;

const MAX_STACK_SIZE: usize = 1000;
const MAX_SCRIPT_SIZE: usize = 10_000;
const MAX_OPS_PER_SCRIPT: usize = 201;
const MAX_PUBKEYS_PER_MULTISIG: i64 = 20;

static SECP256K1: OnceLock<Secp256k1<VerifyOnly>> = OnceLock::new();

fn with_verification_ctx<R>(f: impl FnOnce(&Secp256k1<VerifyOnly>) -> R) -> R {
    f(SECP256K1.get_or_init(Secp256k1::verification_only))
}

/// One level of the conditional-execution stack.
///
/// `True` and `False` track a branch whose condition was actually
/// evaluated; `ELSE` toggles between them. `Skip` marks a conditional
/// opened inside an already-skipped branch: no condition was consumed,
/// and `ELSE` must leave it inert so the skipped region stays skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CondState {
    True,
    False,
    Skip,
}

fn is_conditional(value: u8) -> bool {
    matches!(value, OP_IF | OP_NOTIF | OP_ELSE | OP_ENDIF)
}

/// Evaluates spending conditions for one transaction input.
#[derive(Debug)]
pub struct Engine {
    scripts: Vec<Vec<ParsedOpcode>>,
    script_idx: usize,
    script_off: usize,
    last_code_sep: usize,
    dstack: Stack,
    astack: Stack,
    cond_stack: Vec<CondState>,
    tx: Transaction,
    tx_idx: usize,
    input_amount: i64,
    bip16: bool,
    saved_first_stack: Vec<Vec<u8>>,
    num_ops: usize,
    sig_ops: usize,
}

impl Engine {
    /// Parses both scripts and prepares an engine positioned at the
    /// first opcode of the signature script.
    ///
    /// `input_amount` is the value of the output being spent; legacy
    /// evaluation never consults it, but it is part of the spend
    /// context and exposed via [`Engine::input_amount`].
    pub fn new(
        sig_script: &[u8],
        pk_script: &[u8],
        input_idx: usize,
        tx: Transaction,
        input_amount: i64,
        p2sh_enabled: bool,
    ) -> Result<Self, ScriptError> {
        if input_idx >= tx.input.len() {
            return Err(ScriptError::InvalidIndex);
        }

        let mut scripts = Vec::with_capacity(2);
        for bytes in [sig_script, pk_script] {
            if bytes.len() > MAX_SCRIPT_SIZE {
                return Err(ScriptError::ScriptTooLarge);
            }
            scripts.push(parse_script(bytes)?);
        }

        let bip16 = p2sh_enabled && is_script_hash(&scripts[1]);
        if bip16 && !is_push_only(&scripts[0]) {
            return Err(ScriptError::NonPushOnly);
        }

        let mut engine = Engine {
            scripts,
            script_idx: 0,
            script_off: 0,
            last_code_sep: 0,
            dstack: Stack::new(),
            astack: Stack::new(),
            cond_stack: Vec::new(),
            tx,
            tx_idx: input_idx,
            input_amount,
            bip16,
            saved_first_stack: Vec::new(),
            num_ops: 0,
            sig_ops: 0,
        };

        // Empty signature scripts occur on-chain; position the cursor
        // on the first opcode that actually exists.
        while engine.script_idx < engine.scripts.len()
            && engine.scripts[engine.script_idx].is_empty()
        {
            if engine.script_idx == 0 && engine.bip16 {
                engine.saved_first_stack = engine.dstack.items();
            }
            engine.script_idx += 1;
        }

        Ok(engine)
    }

    /// Executes the opcode under the cursor and advances. Returns
    /// `true` once the cursor has moved past the last script.
    pub fn step(&mut self) -> Result<bool, ScriptError> {
        if self.done() {
            return Ok(true);
        }

        let pop = self.scripts[self.script_idx][self.script_off].clone();
        self.execute_opcode(&pop)?;

        if self.dstack.depth() + self.astack.depth() > MAX_STACK_SIZE {
            return Err(ScriptError::StackOverflow);
        }

        self.script_off += 1;
        while self.script_idx < self.scripts.len()
            && self.script_off >= self.scripts[self.script_idx].len()
        {
            if !self.cond_stack.is_empty() {
                return Err(ScriptError::MissingEndif);
            }
            // The op budget and code-separator position are per script.
            self.num_ops = 0;
            self.last_code_sep = 0;

            if self.script_idx == 0 {
                if self.bip16 {
                    self.saved_first_stack = self.dstack.items();
                }
            } else if self.script_idx == 1 && self.bip16 {
                // The public-key script only hashed the redeem script;
                // confirm it matched, then run the redeem script itself
                // against the stack the signature script produced.
                self.ensure_success()?;
                let mut saved = std::mem::take(&mut self.saved_first_stack);
                let redeem = saved.pop().ok_or(ScriptError::Underflow)?;
                let pops = parse_script(&redeem)?;
                self.scripts.push(pops);
                self.dstack.set_items(saved);
            }

            self.script_idx += 1;
            self.script_off = 0;
        }

        Ok(self.done())
    }

    /// Runs the engine to completion, then applies the final stack
    /// check: the evaluation succeeds only if the stack is non-empty
    /// and its top entry is true.
    pub fn execute(&mut self) -> Result<(), ScriptError> {
        while !self.step()? {}
        self.ensure_success()
    }

    fn done(&self) -> bool {
        self.script_idx >= self.scripts.len()
    }

    fn ensure_success(&mut self) -> Result<(), ScriptError> {
        if self.dstack.is_empty() || !self.dstack.pop_bool()? {
            return Err(ScriptError::EvalFalse);
        }
        Ok(())
    }

    /// Count of signature-check operations executed so far; multisig
    /// checks count once per declared public key.
    pub fn sig_ops(&self) -> usize {
        self.sig_ops
    }

    /// Value of the spent output this engine was constructed with.
    pub fn input_amount(&self) -> i64 {
        self.input_amount
    }

    /// Contents of the data stack, bottom first.
    pub fn data_stack(&self) -> Vec<Vec<u8>> {
        self.dstack.items()
    }

    /// Replaces the data stack contents. Test surface.
    pub fn set_data_stack(&mut self, items: Vec<Vec<u8>>) {
        self.dstack.set_items(items);
    }

    /// Contents of the alt stack, bottom first.
    pub fn alt_stack(&self) -> Vec<Vec<u8>> {
        self.astack.items()
    }

    /// Replaces the alt stack contents. Test surface.
    pub fn set_alt_stack(&mut self, items: Vec<Vec<u8>>) {
        self.astack.set_items(items);
    }

    /// Disassembles the opcode under the cursor as
    /// `"{script:02x}:{offset:04x}: {opcode}"`.
    pub fn disasm_pc(&self) -> Result<String, ScriptError> {
        let pop = self
            .scripts
            .get(self.script_idx)
            .and_then(|script| script.get(self.script_off))
            .ok_or(ScriptError::InvalidIndex)?;
        Ok(format!(
            "{:02x}:{:04x}: {}",
            self.script_idx,
            self.script_off,
            pop.disasm()?
        ))
    }

    /// Disassembles an entire script slot, one line per opcode, each
    /// line terminated by a newline.
    pub fn disasm_script(&self, idx: usize) -> Result<String, ScriptError> {
        let script = self.scripts.get(idx).ok_or(ScriptError::InvalidIndex)?;
        let mut out = String::new();
        for (off, pop) in script.iter().enumerate() {
            out.push_str(&format!("{:02x}:{:04x}: {}\n", idx, off, pop.disasm()?));
        }
        Ok(out)
    }

    fn is_executing(&self) -> bool {
        self.cond_stack.iter().all(|cond| *cond == CondState::True)
    }

    fn execute_opcode(&mut self, pop: &ParsedOpcode) -> Result<(), ScriptError> {
        let info = pop.info();

        // Disabled opcodes poison the script wherever they appear,
        // skipped branches included.
        if info.class == OpcodeClass::Disabled {
            return Err(ScriptError::OpDisabled);
        }

        // The op budget and the element-size cap also apply inside
        // skipped branches.
        if info.value > OP_16 {
            self.num_ops += 1;
            if self.num_ops > MAX_OPS_PER_SCRIPT {
                return Err(ScriptError::TooManyOps);
            }
        } else if pop.data.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ScriptError::ItemTooLarge);
        }

        if !self.is_executing() && !is_conditional(info.value) {
            return Ok(());
        }

        match info.value {
            OP_0 => self.dstack.push_bytes(Vec::new()),
            OP_DATA_1..=OP_PUSHDATA4 => self.dstack.push_bytes(pop.data.clone()),
            OP_1NEGATE => self.dstack.push_int(-1),
            OP_1..=OP_16 => self.dstack.push_int((info.value - OP_1 + 1) as i64),

            OP_RESERVED | OP_VER | OP_VERIF | OP_VERNOTIF | OP_RESERVED1 | OP_RESERVED2 => {
                Err(ScriptError::ReservedOpcode)
            }

            OP_NOP => Ok(()),
            OP_NOP1..=OP_NOP10 => Ok(()),

            OP_IF => self.op_if(false),
            OP_NOTIF => self.op_if(true),
            OP_ELSE => self.op_else(),
            OP_ENDIF => self.op_endif(),
            OP_VERIFY => self.op_verify(),
            OP_RETURN => Err(ScriptError::EarlyReturn),

            OP_TOALTSTACK => {
                let entry = self.dstack.pop_bytes()?;
                self.astack.push_bytes(entry)
            }
            OP_FROMALTSTACK => {
                let entry = self.astack.pop_bytes()?;
                self.dstack.push_bytes(entry)
            }
            OP_2DROP => self.dstack.drop_n(2),
            OP_2DUP => self.dstack.dup_n(2),
            OP_3DUP => self.dstack.dup_n(3),
            OP_2OVER => self.dstack.over_n(2),
            OP_2ROT => self.dstack.rot_n(2),
            OP_2SWAP => self.dstack.swap_n(2),
            OP_IFDUP => {
                let entry = self.dstack.peek_bytes(0)?.to_vec();
                if as_bool(&entry) {
                    self.dstack.push_bytes(entry)?;
                }
                Ok(())
            }
            OP_DEPTH => {
                let depth = self.dstack.depth() as i64;
                self.dstack.push_int(depth)
            }
            OP_DROP => self.dstack.drop_n(1),
            OP_DUP => self.dstack.dup_n(1),
            OP_NIP => self.dstack.nip_n(1),
            OP_OVER => self.dstack.over_n(1),
            OP_PICK => {
                let idx = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
                self.dstack.pick_n(idx)
            }
            OP_ROLL => {
                let idx = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
                self.dstack.roll_n(idx)
            }
            OP_ROT => self.dstack.rot_n(1),
            OP_SWAP => self.dstack.swap_n(1),
            OP_TUCK => self.dstack.tuck(),

            OP_SIZE => {
                let size = self.dstack.peek_bytes(0)?.len() as i64;
                self.dstack.push_int(size)
            }
            OP_EQUAL => self.op_equal(),
            OP_EQUALVERIFY => {
                self.op_equal()?;
                self.op_verify()
            }

            OP_1ADD | OP_1SUB | OP_NEGATE | OP_ABS | OP_NOT | OP_0NOTEQUAL => {
                let num = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
                let result = match info.value {
                    OP_1ADD => num + 1,
                    OP_1SUB => num - 1,
                    OP_NEGATE => -num,
                    OP_ABS => num.abs(),
                    OP_NOT => i64::from(num == 0),
                    _ => i64::from(num != 0),
                };
                self.dstack.push_int(result)
            }

            OP_ADD | OP_SUB | OP_BOOLAND | OP_BOOLOR | OP_NUMEQUAL | OP_NUMEQUALVERIFY
            | OP_NUMNOTEQUAL | OP_LESSTHAN | OP_GREATERTHAN | OP_LESSTHANOREQUAL
            | OP_GREATERTHANOREQUAL | OP_MIN | OP_MAX => {
                let b = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
                let a = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
                let result = match info.value {
                    OP_ADD => a + b,
                    OP_SUB => a - b,
                    OP_BOOLAND => i64::from(a != 0 && b != 0),
                    OP_BOOLOR => i64::from(a != 0 || b != 0),
                    OP_NUMEQUAL | OP_NUMEQUALVERIFY => i64::from(a == b),
                    OP_NUMNOTEQUAL => i64::from(a != b),
                    OP_LESSTHAN => i64::from(a < b),
                    OP_GREATERTHAN => i64::from(a > b),
                    OP_LESSTHANOREQUAL => i64::from(a <= b),
                    OP_GREATERTHANOREQUAL => i64::from(a >= b),
                    OP_MIN => a.min(b),
                    _ => a.max(b),
                };
                self.dstack.push_int(result)?;
                if info.value == OP_NUMEQUALVERIFY {
                    self.op_verify()?;
                }
                Ok(())
            }

            OP_WITHIN => {
                let max = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
                let min = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
                let value = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
                self.dstack.push_bool(value >= min && value < max)
            }

            OP_RIPEMD160 => {
                let data = self.dstack.pop_bytes()?;
                let digest = ripemd160::Hash::hash(&data);
                self.dstack.push_bytes(digest.to_byte_array().to_vec())
            }
            OP_SHA1 => {
                let data = self.dstack.pop_bytes()?;
                let digest = sha1::Hash::hash(&data);
                self.dstack.push_bytes(digest.to_byte_array().to_vec())
            }
            OP_SHA256 => {
                let data = self.dstack.pop_bytes()?;
                let digest = sha256::Hash::hash(&data);
                self.dstack.push_bytes(digest.to_byte_array().to_vec())
            }
            OP_HASH160 => {
                let data = self.dstack.pop_bytes()?;
                let digest = hash160::Hash::hash(&data);
                self.dstack.push_bytes(digest.to_byte_array().to_vec())
            }
            OP_HASH256 => {
                let data = self.dstack.pop_bytes()?;
                let digest = sha256d::Hash::hash(&data);
                self.dstack.push_bytes(digest.to_byte_array().to_vec())
            }

            OP_CODESEPARATOR => {
                self.last_code_sep = self.script_off + 1;
                Ok(())
            }
            OP_CHECKSIG => self.op_checksig(),
            OP_CHECKSIGVERIFY => {
                self.op_checksig()?;
                self.op_verify()
            }
            OP_CHECKMULTISIG => self.op_checkmultisig(),
            OP_CHECKMULTISIGVERIFY => {
                self.op_checkmultisig()?;
                self.op_verify()
            }

            _ => Err(ScriptError::InvalidOpcode),
        }
    }

    fn op_if(&mut self, negate: bool) -> Result<(), ScriptError> {
        let state = if self.is_executing() {
            let mut cond = self.dstack.pop_bool()?;
            if negate {
                cond = !cond;
            }
            if cond {
                CondState::True
            } else {
                CondState::False
            }
        } else {
            CondState::Skip
        };
        self.cond_stack.push(state);
        Ok(())
    }

    fn op_else(&mut self) -> Result<(), ScriptError> {
        let top = self.cond_stack.last_mut().ok_or(ScriptError::NoIf)?;
        *top = match *top {
            CondState::True => CondState::False,
            CondState::False => CondState::True,
            CondState::Skip => CondState::Skip,
        };
        Ok(())
    }

    fn op_endif(&mut self) -> Result<(), ScriptError> {
        self.cond_stack.pop().ok_or(ScriptError::NoIf)?;
        Ok(())
    }

    fn op_verify(&mut self) -> Result<(), ScriptError> {
        if !self.dstack.pop_bool()? {
            return Err(ScriptError::VerifyFailed);
        }
        Ok(())
    }

    fn op_equal(&mut self) -> Result<(), ScriptError> {
        let a = self.dstack.pop_bytes()?;
        let b = self.dstack.pop_bytes()?;
        self.dstack.push_bool(a == b)
    }

    fn op_checksig(&mut self) -> Result<(), ScriptError> {
        let pk_bytes = self.dstack.pop_bytes()?;
        let sig_bytes = self.dstack.pop_bytes()?;
        self.sig_ops += 1;

        let subscript = remove_opcode(self.subscript(), OP_CODESEPARATOR);
        let valid = self.check_sig(&sig_bytes, &pk_bytes, subscript);
        self.dstack.push_bool(valid)
    }

    fn op_checkmultisig(&mut self) -> Result<(), ScriptError> {
        let num_keys = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
        if !(1..=MAX_PUBKEYS_PER_MULTISIG).contains(&num_keys) {
            return Err(ScriptError::TooManyPubkeys);
        }
        let num_keys = num_keys as usize;
        self.num_ops += num_keys;
        if self.num_ops > MAX_OPS_PER_SCRIPT {
            return Err(ScriptError::TooManyOps);
        }
        self.sig_ops += num_keys;

        // Popping order leaves both lists top-of-stack first, so the
        // in-order subsequence check below walks them in parallel.
        let mut pubkeys = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            pubkeys.push(self.dstack.pop_bytes()?);
        }

        let num_sigs = self.dstack.pop_int(SCRIPTNUM_MAX_LEN)?;
        if num_sigs < 0 || num_sigs as usize > num_keys {
            return Err(ScriptError::InvalidArgs);
        }
        let num_sigs = num_sigs as usize;
        let mut sigs = Vec::with_capacity(num_sigs);
        for _ in 0..num_sigs {
            sigs.push(self.dstack.pop_bytes()?);
        }

        // The protocol consumes one extra entry beyond the signatures.
        // Its content is ignored; preserved as-is.
        self.dstack.pop_bytes()?;

        let subscript = remove_opcode(self.subscript(), OP_CODESEPARATOR);
        let mut success = true;
        let mut sig_idx = 0;
        let mut key_idx = 0;
        while success && sig_idx < sigs.len() {
            if pubkeys.len() - key_idx < sigs.len() - sig_idx {
                success = false;
                break;
            }
            if self.check_sig(&sigs[sig_idx], &pubkeys[key_idx], subscript.clone()) {
                sig_idx += 1;
            }
            key_idx += 1;
        }

        self.dstack.push_bool(success)
    }

    /// Parsed opcodes of the current script from the last executed
    /// `OP_CODESEPARATOR` onward.
    fn subscript(&self) -> Vec<ParsedOpcode> {
        self.scripts[self.script_idx][self.last_code_sep..].to_vec()
    }

    /// Splits a signature into DER body and hash type, strips the
    /// signature's own pushes from the subscript, and verifies against
    /// the resulting digest. Malformed signatures and public keys are
    /// a `false` result, never an error.
    fn check_sig(&self, sig_bytes: &[u8], pk_bytes: &[u8], subscript: Vec<ParsedOpcode>) -> bool {
        let Some((&hash_type, der)) = sig_bytes.split_last() else {
            return false;
        };

        let filtered = remove_opcode_by_data(subscript, sig_bytes);
        let script_bytes = serialize_script(&filtered);
        let digest = signature_hash(&script_bytes, hash_type, &self.tx, self.tx_idx);

        let Ok(pubkey) = PublicKey::from_slice(pk_bytes) else {
            return false;
        };
        let Ok(signature) = EcdsaSignature::from_der_lax(der) else {
            return false;
        };
        let mut normalized = signature;
        normalized.normalize_s();
        let message = Message::from_digest(digest);
        with_verification_ctx(|secp| secp.verify_ecdsa(&message, &normalized, &pubkey).is_ok())
    }
}
