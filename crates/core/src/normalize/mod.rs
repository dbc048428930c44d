//! Instruction token validation and canonicalization.
//!
//! Every instruction entering the catalog passes through [`normalize`] first.
//! The rules encode how tokens must be spelled before they are comparable:
//! prefixes are fused into the instruction they modify (`"lock xadd"`, never a
//! bare `"lock"` element), pause is its zero-operand mnemonic rather than a
//! literal `"rep nop"`, and interrupt operands use the `int $0xHH` form.
//!
//! Case and whitespace are the ingestion collaborator's responsibility;
//! accepted tokens pass through unchanged, which makes normalization
//! idempotent. The empty token is valid: it is the sentinel for a pure
//! compiler/memory barrier (`asm("" ::: "memory")` and friends).

use thiserror::Error;

/// x86 instruction prefixes that must never stand alone as a sequence element.
///
/// See <http://www.c-jump.com/CIS77/CPU/x86/X77_0240_prefix.htm>.
const BARE_PREFIXES: [&str; 3] = ["lock", "rep", "repne"];

/// Rejection reasons for malformed instruction tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInstruction {
    /// A prefix was submitted as its own sequence element.
    #[error("bare instruction prefix {0:?}; fold the prefix into the instruction it modifies, e.g. \"lock xadd\" instead of \"lock;xadd\"")]
    BarePrefix(String),

    /// The literal spelling `rep nop` was submitted instead of the pause mnemonic.
    #[error("\"rep nop\" must be submitted as the zero-operand pause mnemonic")]
    RawRepNop,

    /// An interrupt instruction with an operand not of the form `int $0xHH`.
    #[error("interrupt operands must use the form \"int $0xa3\" (two lower-case hex digits), got {0:?}")]
    MalformedInterrupt(String),
}

/// Non-fatal advisories attached to an otherwise accepted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caution {
    /// A bare `xchg` was submitted; `lock xchg` is the atomic spelling and is
    /// almost always what the source meant.
    BareXchg,
}

/// Result of a successful normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInstruction {
    /// The canonical token text, stored verbatim in the catalog.
    pub text: String,
    /// Advisory attached to the token, if any. Warnings never block insertion.
    pub caution: Option<Caution>,
}

/// Validate and canonicalize a single instruction token.
///
/// Pure function; run synchronously before any catalog insert. Rules apply in
/// order, first match wins:
/// 1. bare prefixes (`lock`, `rep`, `repne`) are rejected;
/// 2. the literal `rep nop` is rejected;
/// 3. a bare `xchg` is accepted with [`Caution::BareXchg`];
/// 4. `int`-operand tokens must match `int $0xHH` exactly;
/// 5. everything else passes through unchanged.
pub fn normalize(token: &str) -> Result<NormalizedInstruction, InvalidInstruction> {
    if BARE_PREFIXES.contains(&token) {
        return Err(InvalidInstruction::BarePrefix(token.to_string()));
    }

    if token == "rep nop" {
        return Err(InvalidInstruction::RawRepNop);
    }

    if token == "xchg" {
        return Ok(NormalizedInstruction {
            text: token.to_string(),
            caution: Some(Caution::BareXchg),
        });
    }

    if token.starts_with("int ") && !is_canonical_interrupt(token) {
        return Err(InvalidInstruction::MalformedInterrupt(token.to_string()));
    }

    Ok(NormalizedInstruction { text: token.to_string(), caution: None })
}

/// True iff `token` is exactly `int $0xHH` with two lower-case hex digits.
fn is_canonical_interrupt(token: &str) -> bool {
    let digits = match token.strip_prefix("int $0x") {
        Some(rest) => rest,
        None => return false,
    };
    digits.len() == 2
        && digits.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// True iff the instruction is a conditional or unconditional jump.
///
/// This is the single source of truth for the control-flow flag derived when
/// an instruction is first cataloged; the integrity pass re-checks stored
/// rows against the same rule.
pub fn is_control_flow(text: &str) -> bool {
    text.starts_with('j')
}

/// Split raw sequence text into instruction tokens.
///
/// Semicolon and comma are equivalent separators; the exact source text
/// (including its separators) remains the sequence's identity, only the
/// tokens are derived from it.
pub fn split_sequence_text(raw: &str) -> Vec<String> {
    raw.replace(',', ";").split(';').map(|t| t.to_string()).collect()
}
