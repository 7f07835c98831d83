//! End-to-end pass/fail vectors: every script runs as the public-key
//! script of a one-input transaction, through `execute()` including
//! the final stack check.

use bitcoin::{
    absolute::LockTime,
    hashes::{hash160, Hash},
    transaction::Version,
    Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};
use txscript::opcodes::*;
use txscript::{verify_spend, Engine, ScriptError};

fn spending_tx(sig_script: &[u8]) -> Transaction {
    Transaction {
        version: Version(1),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: bitcoin::Txid::from_byte_array([1u8; 32]),
                vout: 0,
            },
            script_sig: ScriptBuf::from_bytes(sig_script.to_vec()),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(0x12a05f200),
            script_pubkey: ScriptBuf::new(),
        }],
    }
}

fn run_pk_script(script: &[u8]) -> Result<(), ScriptError> {
    verify_spend(&[], script, 0, spending_tx(&[]), 0, false)
}

fn assert_passes(script: &[u8]) {
    run_pk_script(script).unwrap_or_else(|err| {
        panic!("script {script:02x?} should pass, failed with {err:?}");
    });
}

fn assert_fails(script: &[u8]) {
    assert!(
        run_pk_script(script).is_err(),
        "script {script:02x?} should fail"
    );
}

fn assert_fails_with(script: &[u8], expected: ScriptError) {
    assert_eq!(run_pk_script(script), Err(expected), "script {script:02x?}");
}

#[test]
fn trivial_outcomes() {
    // A bare OP_TRUE authorizes the spend; anything that leaves a
    // false or empty stack does not.
    assert_passes(&[OP_TRUE]);
    assert_fails_with(&[OP_FALSE], ScriptError::EvalFalse);
    assert_fails_with(&[OP_NOP], ScriptError::EvalFalse);
    assert_fails_with(&[], ScriptError::EvalFalse);
}

#[test]
fn verify_and_return() {
    assert_passes(&[OP_TRUE, OP_VERIFY, OP_TRUE]);
    assert_fails_with(&[OP_FALSE, OP_VERIFY, OP_TRUE], ScriptError::VerifyFailed);
    assert_fails_with(&[OP_VERIFY], ScriptError::Underflow);
    assert_fails_with(&[OP_RETURN], ScriptError::EarlyReturn);
    assert_fails_with(&[OP_TRUE, OP_RETURN], ScriptError::EarlyReturn);
}

#[test]
fn arithmetic_chains() {
    assert_passes(&[OP_TRUE, OP_1ADD, OP_2, OP_EQUAL]);
    assert_passes(&[OP_FALSE, OP_1ADD]);
    assert_fails_with(&[OP_1ADD], ScriptError::Underflow);
    assert_passes(&[OP_2, OP_3, OP_ADD, OP_5, OP_NUMEQUAL]);
    assert_passes(&[OP_5, OP_3, OP_SUB, OP_2, OP_EQUAL]);
    assert_passes(&[OP_2, OP_NEGATE, OP_1NEGATE, OP_1NEGATE, OP_ADD, OP_NUMEQUAL]);
    assert_passes(&[OP_16, OP_ABS, OP_16, OP_NUMEQUAL]);
    assert_fails(&[OP_TRUE, OP_FALSE, OP_NUMEQUAL]);
    assert_passes(&[OP_TRUE, OP_FALSE, OP_NUMNOTEQUAL]);
    assert_passes(&[OP_TRUE, OP_TRUE, OP_NUMEQUALVERIFY, OP_TRUE]);
    assert_fails_with(
        &[OP_TRUE, OP_FALSE, OP_NUMEQUALVERIFY, OP_TRUE],
        ScriptError::VerifyFailed,
    );
    assert_passes(&[OP_FALSE, OP_TRUE, OP_LESSTHAN]);
    assert_fails(&[OP_TRUE, OP_FALSE, OP_LESSTHAN]);
    assert_passes(&[OP_TRUE, OP_FALSE, OP_GREATERTHAN]);
    assert_passes(&[OP_TRUE, OP_TRUE, OP_GREATERTHANOREQUAL]);
    assert_passes(&[OP_TRUE, OP_FALSE, OP_GREATERTHANOREQUAL]);
    assert_fails(&[OP_FALSE, OP_TRUE, OP_GREATERTHANOREQUAL]);
    assert_passes(&[OP_2, OP_3, OP_MIN, OP_2, OP_NUMEQUAL]);
    assert_passes(&[OP_2, OP_3, OP_MAX, OP_3, OP_NUMEQUAL]);
    assert_passes(&[OP_3, OP_2, OP_5, OP_WITHIN]);
    assert_fails(&[OP_5, OP_2, OP_5, OP_WITHIN]);
    assert_passes(&[OP_FALSE, OP_NOT]);
    assert_fails(&[OP_TRUE, OP_NOT]);
    assert_passes(&[OP_TRUE, OP_TRUE, OP_BOOLAND]);
    assert_fails(&[OP_TRUE, OP_FALSE, OP_BOOLAND]);
    assert_passes(&[OP_TRUE, OP_FALSE, OP_BOOLOR]);
    assert_fails(&[OP_FALSE, OP_FALSE, OP_BOOLOR]);
}

#[test]
fn conditionals() {
    // The two arms of a plain IF/ELSE/ENDIF.
    assert_passes(&[OP_0, OP_IF, OP_0, OP_ELSE, OP_2, OP_ENDIF]);
    assert_fails_with(
        &[OP_1, OP_IF, OP_0, OP_ELSE, OP_2, OP_ENDIF],
        ScriptError::EvalFalse,
    );
    assert_passes(&[OP_1, OP_NOTIF, OP_0, OP_ELSE, OP_2, OP_ENDIF]);
    assert_fails(&[OP_0, OP_NOTIF, OP_0, OP_ELSE, OP_2, OP_ENDIF]);

    // Missing terminators and missing conditions.
    assert_fails_with(
        &[OP_0, OP_IF, OP_0, OP_ELSE, OP_2],
        ScriptError::MissingEndif,
    );
    assert_fails_with(
        &[OP_1, OP_NOTIF, OP_0, OP_ELSE, OP_2],
        ScriptError::MissingEndif,
    );
    assert_fails_with(&[OP_ENDIF], ScriptError::NoIf);
    assert_fails_with(&[OP_ELSE, OP_0, OP_ENDIF], ScriptError::NoIf);
    assert_fails_with(&[OP_NOTIF, OP_0, OP_ENDIF], ScriptError::Underflow);

    // Nested conditionals: the inner IF needs its own condition.
    assert_passes(&[
        OP_1, OP_1, OP_IF, OP_IF, OP_1, OP_ELSE, OP_0, OP_ENDIF, OP_ENDIF,
    ]);
    assert_fails_with(
        &[OP_1, OP_IF, OP_IF, OP_1, OP_ELSE, OP_0, OP_ENDIF, OP_ENDIF],
        ScriptError::Underflow,
    );

    // Inner conditionals inside a skipped branch consume nothing and
    // leave the skip in force.
    assert_passes(&[
        OP_0, OP_IF, OP_IF, OP_0, OP_ELSE, OP_0, OP_ENDIF, OP_ELSE, OP_1, OP_ENDIF,
    ]);
    assert_passes(&[
        OP_0, OP_IF, OP_NOTIF, OP_0, OP_ELSE, OP_0, OP_ENDIF, OP_ELSE, OP_1, OP_ENDIF,
    ]);
}

#[test]
fn disabled_reserved_and_unassigned() {
    assert_fails_with(&[OP_CAT], ScriptError::OpDisabled);
    assert_fails_with(&[186], ScriptError::InvalidOpcode);
    assert_fails_with(&[OP_RESERVED], ScriptError::ReservedOpcode);
    // Disabled opcodes poison skipped branches; reserved and
    // unassigned ones do not.
    assert_fails_with(
        &[OP_0, OP_IF, OP_CAT, OP_ENDIF, OP_1],
        ScriptError::OpDisabled,
    );
    assert_passes(&[OP_0, OP_IF, OP_RESERVED, OP_ENDIF, OP_1]);
    assert_passes(&[OP_0, OP_IF, 186, OP_ENDIF, OP_1]);
}

#[test]
fn malformed_multisig_never_panics() {
    // A public key and a key count, but no signature count below them.
    let mut script = vec![OP_DATA_65];
    script.extend_from_slice(&[0x04; 65]);
    script.extend([OP_1, OP_CHECKMULTISIG]);
    assert_fails_with(&script, ScriptError::Underflow);
}

#[test]
fn deep_nesting_is_fine() {
    let mut script = Vec::new();
    for _ in 0..50 {
        script.extend([OP_1, OP_IF]);
    }
    script.push(OP_1);
    for _ in 0..50 {
        script.push(OP_ENDIF);
    }
    assert_passes(&script);
}

#[test]
fn evaluation_is_deterministic() {
    let scripts: Vec<Vec<u8>> = vec![
        vec![OP_TRUE],
        vec![OP_FALSE, OP_VERIFY],
        vec![OP_1, OP_2, OP_ADD, OP_3, OP_NUMEQUAL],
        vec![186],
        vec![OP_CAT],
        vec![OP_0, OP_IF, OP_0, OP_ELSE, OP_2, OP_ENDIF],
    ];
    for script in scripts {
        let first = run_pk_script(&script);
        for _ in 0..3 {
            assert_eq!(first, run_pk_script(&script), "script {script:02x?}");
        }
    }
}

fn p2sh_script_for(redeem: &[u8]) -> Vec<u8> {
    let digest = hash160::Hash::hash(redeem);
    let mut script = vec![OP_HASH160, OP_DATA_20];
    script.extend_from_slice(&digest.to_byte_array());
    script.push(OP_EQUAL);
    script
}

fn push(data: &[u8]) -> Vec<u8> {
    let mut out = vec![data.len() as u8];
    out.extend_from_slice(data);
    out
}

#[test]
fn p2sh_executes_the_redeem_script() {
    let redeem = [OP_2, OP_3, OP_ADD, OP_5, OP_NUMEQUAL];
    let sig_script = push(&redeem);
    let pk_script = p2sh_script_for(&redeem);
    verify_spend(
        &sig_script,
        &pk_script,
        0,
        spending_tx(&sig_script),
        0,
        true,
    )
    .expect("redeem script evaluates true");
}

#[test]
fn p2sh_flag_changes_the_outcome() {
    // The redeem script evaluates to false. Without P2SH rules the
    // hash comparison alone decides, so the same spend passes.
    let redeem = [OP_0];
    let sig_script = push(&redeem);
    let pk_script = p2sh_script_for(&redeem);
    assert_eq!(
        verify_spend(
            &sig_script,
            &pk_script,
            0,
            spending_tx(&sig_script),
            0,
            true,
        ),
        Err(ScriptError::EvalFalse)
    );
    verify_spend(
        &sig_script,
        &pk_script,
        0,
        spending_tx(&sig_script),
        0,
        false,
    )
    .expect("plain hash comparison passes");
}

#[test]
fn p2sh_rejects_wrong_redeem_scripts() {
    let redeem = [OP_1];
    let other = [OP_2];
    let sig_script = push(&other);
    let pk_script = p2sh_script_for(&redeem);
    assert_eq!(
        verify_spend(
            &sig_script,
            &pk_script,
            0,
            spending_tx(&sig_script),
            0,
            true,
        ),
        Err(ScriptError::EvalFalse)
    );
}

#[test]
fn p2sh_requires_push_only_signature_scripts() {
    let redeem = [OP_1];
    let mut sig_script = push(&redeem);
    sig_script.push(OP_DUP);
    let pk_script = p2sh_script_for(&redeem);
    assert_eq!(
        Engine::new(
            &sig_script,
            &pk_script,
            0,
            spending_tx(&sig_script),
            0,
            true,
        )
        .err(),
        Some(ScriptError::NonPushOnly)
    );
    // The same script sig is fine when P2SH rules are off.
    verify_spend(
        &sig_script,
        &pk_script,
        0,
        spending_tx(&sig_script),
        0,
        false,
    )
    .expect("non-push script sig without p2sh");
}

#[test]
fn p2sh_with_nested_evaluation_state() {
    // Redeem script with its own conditionals and alt-stack use.
    let redeem = [
        OP_1, OP_IF, OP_5, OP_TOALTSTACK, OP_FROMALTSTACK, OP_ELSE, OP_0, OP_ENDIF,
    ];
    let sig_script = push(&redeem);
    let pk_script = p2sh_script_for(&redeem);
    verify_spend(
        &sig_script,
        &pk_script,
        0,
        spending_tx(&sig_script),
        0,
        true,
    )
    .expect("redeem script with conditionals");
}

#[test]
fn p2sh_redeem_script_sees_remaining_pushes() {
    // The signature script supplies an argument below the redeem
    // script push; the redeem script consumes it.
    let redeem = [OP_3, OP_NUMEQUAL];
    let mut sig_script = vec![OP_3];
    sig_script.extend(push(&redeem));
    let pk_script = p2sh_script_for(&redeem);
    verify_spend(
        &sig_script,
        &pk_script,
        0,
        spending_tx(&sig_script),
        0,
        true,
    )
    .expect("argument flows into the redeem script");
}

#[test]
fn script_size_limit_applies_per_script() {
    let big = vec![OP_NOP; 10_001];
    assert_eq!(
        Engine::new(&big, &[OP_1], 0, spending_tx(&[]), 0, false).err(),
        Some(ScriptError::ScriptTooLarge)
    );
    assert_eq!(
        Engine::new(&[], &big, 0, spending_tx(&[]), 0, false).err(),
        Some(ScriptError::ScriptTooLarge)
    );
}
