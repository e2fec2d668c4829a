//! Общие данные для бенчмарков.

/// Комплексная синусоида из 12-битных выборок, выровненных влево.
pub fn twelve_bit_tone(n: usize) -> Vec<[i16; 2]> {
    (0..n)
        .map(|i| {
            let p = i as f32 * 0.01;
            [
                ((2_047.0 * p.sin()) as i16) << 4,
                ((2_047.0 * p.cos()) as i16) << 4,
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_low_nibble_clear() {
        let tone = twelve_bit_tone(1_000);

        assert_eq!(tone.len(), 1_000);
        assert!(tone.iter().flatten().all(|v| v & 0xF == 0));
    }
}
