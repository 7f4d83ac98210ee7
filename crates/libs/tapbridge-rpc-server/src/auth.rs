/// Shared-secret gate applied to the WebSocket handshake.
///
/// An empty token disables the gate. Otherwise the `Authorization` header
/// must be exactly `Bearer <token>`.
#[derive(Clone)]
pub struct BearerAuth {
    expected: Option<String>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").field("enabled", &self.is_enabled()).finish()
    }
}

impl BearerAuth {
    pub fn new(token: &str) -> Self {
        let expected = (!token.is_empty()).then(|| format!("Bearer {token}"));
        Self { expected }
    }

    pub fn is_enabled(&self) -> bool {
        self.expected.is_some()
    }

    pub fn verify(&self, header: Option<&str>) -> bool {
        match &self.expected {
            None => true,
            Some(expected) => header.is_some_and(|header| tokens_equal(header, expected)),
        }
    }
}

/// Length-revealing but otherwise constant-time comparison.
fn tokens_equal(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
