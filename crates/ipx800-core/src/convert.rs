// ── Value conversions ──
//
// Small helpers shared by descriptor identity and the entity adapters.

/// Hub percentage (0..=100) to host brightness (0..=255), rounded half-even.
///
/// Not an exact inverse of [`scale_to_100`]: 254 maps to 100 and back to 255.
pub fn scale_to_255(percent: u8) -> u8 {
    let p = u32::from(percent.min(100));
    clamp_u8(div_round_half_even(p * 255, 100))
}

/// Host brightness (0..=255) to hub percentage (0..=100), rounded half-even.
pub fn scale_to_100(level: u8) -> u8 {
    clamp_u8(div_round_half_even(u32::from(level) * 100, 255)).min(100)
}

fn div_round_half_even(num: u32, den: u32) -> u32 {
    let q = num / den;
    let r = num % den;
    match (r * 2).cmp(&den) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q % 2),
    }
}

fn clamp_u8(v: u32) -> u8 {
    u8::try_from(v).unwrap_or(u8::MAX)
}

/// Lowercase, non-alphanumeric runs collapsed to `_`, trimmed.
///
/// `"Cave Relais 2"` → `"cave_relais_2"`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale() {
        assert_eq!(scale_to_255(0), 0);
        assert_eq!(scale_to_255(100), 255);
        assert_eq!(scale_to_100(255), 100);
        assert_eq!(scale_to_100(0), 0);
    }

    #[test]
    fn out_of_range_percent_clamps() {
        assert_eq!(scale_to_255(180), 255);
    }

    #[test]
    fn round_trip_is_lossy_near_the_top() {
        assert_eq!(scale_to_100(254), 100);
        assert_eq!(scale_to_255(scale_to_100(254)), 255);
    }

    #[test]
    fn midpoints() {
        // 50 * 255 / 100 = 127.5 -> 128 (half to even)
        assert_eq!(scale_to_255(50), 128);
        // 128 * 100 / 255 = 50.19 -> 50
        assert_eq!(scale_to_100(128), 50);
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Cave Relais 2"), "cave_relais_2");
        assert_eq!(slugify("  IPX800 V5 -- Reboot "), "ipx800_v5_reboot");
        assert_eq!(slugify("Température"), "température");
    }
}
