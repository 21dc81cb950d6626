const FRAMES: &[char] = &['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

pub fn frame(idx: usize) -> char {
    FRAMES[idx % FRAMES.len()]
}
