/// Base difficulty for patterns that do not declare one.
pub const DEFAULT_BASE_DIFFICULTY: u8 = 5;
pub const MAX_DIFFICULTY: u8 = 10;
/// Recorded errors needed to raise a pattern's difficulty by one level.
pub const ERRORS_PER_LEVEL: u32 = 3;

/// `min(10, base + floor(errors / 3))`
pub fn phrase_difficulty(base: u8, errors: u32) -> u8 {
    let bump = (errors / ERRORS_PER_LEVEL).min(u32::from(MAX_DIFFICULTY));
    (u32::from(base.max(1)) + bump).min(u32::from(MAX_DIFFICULTY)) as u8
}
