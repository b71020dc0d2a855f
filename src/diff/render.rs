//! Text rendering of a [`DiffResult`]

use super::DiffResult;

/// Line placed between two change blocks
pub const BLOCK_DELIMITER: &str = "----";

/// Render one block per entry:
///
/// ```text
/// *Phase*
/// -Pending
/// +Running
/// ```
///
/// Blocks are joined by [`BLOCK_DELIMITER`]. An empty result renders as `""`.
pub fn render(result: &DiffResult) -> String {
    result
        .iter()
        .map(|entry| format!("*{}*\n-{}\n+{}", entry.path, entry.old_value, entry.new_value))
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", BLOCK_DELIMITER))
}
