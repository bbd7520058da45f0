use resources::objects::simple_app::AppPort;

/// Alphabet for [`safe_encode`]: alphanumerics minus vowels and the digits
/// 0, 1 and 3, so encoded identifiers cannot spell words or look like
/// other numbers.
const ALPHANUMS: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";

/// Map every byte of `s` onto [`ALPHANUMS`]. Deterministic, same length
/// as the input, always a legal DNS-label fragment.
pub fn safe_encode(s: &str) -> String {
    s.bytes()
        .map(|b| ALPHANUMS[b as usize % ALPHANUMS.len()] as char)
        .collect()
}

/// Stable identity for a volume derived from its mount path: the same path
/// yields the same name on every cycle, distinct paths collide only with
/// crc32 probability. The diff engine matches volumes by this name.
pub fn volume_name(mount_path: &str) -> String {
    let checksum = crc32fast::hash(mount_path.as_bytes());
    format!("vol-{}", safe_encode(&format!("{:x}", checksum)))
}

/// Synthesize a name for an unnamed service port: lower-cased
/// `protocol-containerPort`, `tcp-<port>` when the protocol is unset.
/// On collision with a name already taken in the same service: append `b`
/// if the candidate ends in a digit, else increment the trailing letter;
/// past `z`, replace the trailing character with a checksum suffix of
/// protocol+hostPort+containerPort, unique because host ports are
/// deduplicated beforehand.
pub fn service_port_name(port: &AppPort, taken: &[String]) -> String {
    let mut name = match port.protocol {
        Some(protocol) => format!("{}-{}", protocol, port.container_port),
        None => format!("tcp-{}", port.container_port),
    };
    while taken.contains(&name) {
        if name.ends_with(|c: char| c.is_ascii_digit()) {
            name.push('b');
        } else {
            let last = name.pop().unwrap_or('b');
            if last >= 'z' {
                name.push_str(&collision_suffix(port));
                break;
            }
            name.push((last as u8 + 1) as char);
        }
    }
    name
}

fn collision_suffix(port: &AppPort) -> String {
    let protocol = port.protocol.map(|p| p.to_string()).unwrap_or_default();
    let key = format!("{}-{}-{}", protocol, port.host_port, port.container_port);
    safe_encode(&format!("{:x}", crc32fast::hash(key.as_bytes())))
}
