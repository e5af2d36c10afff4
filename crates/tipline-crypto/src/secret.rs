use rand::Rng;

/// Ticket alphabet: upper-case letters and digits, easy to read aloud.
pub const TICKET_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Access-code alphabet: both cases plus digits.
pub const CODE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub const TICKET_LEN: usize = 12;
pub const ACCESS_CODE_LEN: usize = 20;

/// Generate a public report ticket (~62 bits at the default length).
/// Uniqueness is the store's job, not ours.
pub fn generate_ticket(length: usize) -> String {
    generate_from(TICKET_ALPHABET, length)
}

/// Generate a report access code (~119 bits at the default length).
pub fn generate_access_code(length: usize) -> String {
    generate_from(CODE_ALPHABET, length)
}

/// Generate a 256-bit signing key for session tokens.
pub fn generate_signing_key() -> [u8; 32] {
    rand::random()
}

fn generate_from(alphabet: &[u8], length: usize) -> String {
    // ThreadRng is a ChaCha-based CSPRNG reseeded from the OS.
    let mut rng = rand::rng();
    (0..length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}
