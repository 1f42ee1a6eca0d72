use rand::Rng;

const PREFIX: &str = "BK";
const CODE_LEN: usize = 8;
// No 0/O or 1/I so codes can be read back over the phone.
const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a customer-facing booking reference such as `BK7KQ2M9XD`.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("{}{}", PREFIX, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_have_prefix_and_unambiguous_characters() {
        for _ in 0..100 {
            let code = generate();
            assert_eq!(code.len(), PREFIX.len() + CODE_LEN);
            assert!(code.starts_with(PREFIX));
            assert!(code[PREFIX.len()..].bytes().all(|b| CHARSET.contains(&b)));
        }
    }
}
