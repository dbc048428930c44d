use census_core::normalize::{
    is_control_flow, normalize, split_sequence_text, Caution, InvalidInstruction,
};

#[test]
fn bare_prefixes_are_rejected() {
    for prefix in ["lock", "rep", "repne"] {
        match normalize(prefix) {
            Err(InvalidInstruction::BarePrefix(token)) => assert_eq!(token, prefix),
            other => panic!("expected BarePrefix for {prefix:?}, got {other:?}"),
        }
    }
}

#[test]
fn prefixed_instructions_pass() {
    // A fused prefix is the required spelling, not a bare prefix.
    let normalized = normalize("lock xadd").expect("lock xadd is valid");
    assert_eq!(normalized.text, "lock xadd");
    assert!(normalized.caution.is_none());

    let normalized = normalize("rep movs").expect("rep movs is valid");
    assert_eq!(normalized.text, "rep movs");
}

#[test]
fn literal_rep_nop_is_rejected() {
    assert_eq!(normalize("rep nop"), Err(InvalidInstruction::RawRepNop));
}

#[test]
fn bare_xchg_is_accepted_with_caution() {
    let normalized = normalize("xchg").expect("xchg is accepted");
    assert_eq!(normalized.text, "xchg");
    assert_eq!(normalized.caution, Some(Caution::BareXchg));

    // The atomic spelling carries no caution.
    let normalized = normalize("lock xchg").expect("lock xchg is accepted");
    assert!(normalized.caution.is_none());
}

#[test]
fn interrupts_must_use_canonical_operand_form() {
    assert!(normalize("int $0x80").is_ok());
    assert!(normalize("int $0x03").is_ok());

    for bad in ["int 3", "int $3", "int $0x3", "int $0x080", "int $0xAB", "int $0x8g"] {
        match normalize(bad) {
            Err(InvalidInstruction::MalformedInterrupt(token)) => assert_eq!(token, bad),
            other => panic!("expected MalformedInterrupt for {bad:?}, got {other:?}"),
        }
    }
}

#[test]
fn everything_else_passes_through_unchanged() {
    for token in ["mov", "cpuid", "rdtsc", "lock cmpxchg", "", "crc32b"] {
        let normalized = normalize(token).expect("token is valid");
        assert_eq!(normalized.text, token);
        assert!(normalized.caution.is_none());
    }
}

#[test]
fn normalization_is_idempotent() {
    for token in ["mov", "lock xadd", "int $0x80", "xchg", ""] {
        let once = normalize(token).expect("valid token");
        let twice = normalize(&once.text).expect("normalized output stays valid");
        assert_eq!(once, twice);
    }
}

#[test]
fn control_flow_is_derived_from_leading_j() {
    assert!(is_control_flow("jz"));
    assert!(is_control_flow("jmp"));
    assert!(is_control_flow("ja"));
    assert!(!is_control_flow("mov"));
    assert!(!is_control_flow("cmp"));
    assert!(!is_control_flow(""));
}

#[test]
fn sequence_text_splits_on_semicolon_and_comma() {
    assert_eq!(split_sequence_text("mov;lock xadd,jz"), vec!["mov", "lock xadd", "jz"]);
    assert_eq!(split_sequence_text("mov"), vec!["mov"]);
}
