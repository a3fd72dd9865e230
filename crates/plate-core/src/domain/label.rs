//! Label chunker for multi-line plate captions.
//!
//! Plate names are 10–20 characters long and the diagram cells are narrow,
//! so each name is wrapped into fixed-width lines.  Splitting happens on
//! `char` boundaries, never inside a multi-byte character.

/// Characters per caption line used by the position diagram.
pub const DEFAULT_LABEL_CHUNK: usize = 10;

/// Splits `name` into consecutive pieces of `chunk_size` characters.
///
/// The last piece may be shorter.  An empty name yields no pieces.  A
/// `chunk_size` of 0 disables wrapping and returns the whole name as one
/// piece.
pub fn chunk_label(name: &str, chunk_size: usize) -> Vec<String> {
    if name.is_empty() {
        return Vec::new();
    }
    if chunk_size == 0 {
        return vec![name.to_string()];
    }

    let chars: Vec<char> = name.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
