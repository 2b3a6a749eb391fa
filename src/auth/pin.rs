use subtle::ConstantTimeEq;

/// Compare a submitted PIN with the configured one in constant time.
pub fn verify(submitted: &str, expected: &str) -> bool {
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}
