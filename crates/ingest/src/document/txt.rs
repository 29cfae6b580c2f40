/// Decode plain text: UTF-8 first, Latin-1 when that fails. Never errors,
/// since every byte sequence is valid Latin-1.
pub fn extract_txt(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
