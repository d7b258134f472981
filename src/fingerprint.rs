const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;

    while i < 256 {
        let mut c = i as u32;
        let mut j = 0;

        while j < 8 {
            c = if (c & 1) != 0 {
                0xEDB8_8320u32 ^ (c >> 1)
            } else {
                c >> 1
            };
            j += 1;
        }

        table[i] = c;
        i += 1;
    }

    table
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;

    for byte in data {
        let idx = ((crc ^ (*byte as u32)) & 0xFF) as usize;
        crc = CRC_TABLE[idx] ^ (crc >> 8);
    }

    crc ^ 0xFFFF_FFFFu32
}

/// Stable identity for a serialized bot configuration.
pub fn config_fingerprint(config: &serde_json::Value) -> serde_json::Result<String> {
    let encoded = serde_json::to_vec(config)?;
    let digest = crc32(&encoded);
    Ok(format!("crc32:{digest:08x}:len:{}", encoded.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = serde_json::json!({ "min_thrust": 10.0 });
        let b = serde_json::json!({ "min_thrust": 20.0 });
        assert_eq!(config_fingerprint(&a).unwrap(), config_fingerprint(&a).unwrap());
        assert_ne!(config_fingerprint(&a).unwrap(), config_fingerprint(&b).unwrap());
    }
}
