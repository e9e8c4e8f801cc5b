//! Decoders for the kernel mapping attributes recorded per `vm` row.
//!
//! Bit values follow `struct kinfo_vmentry` on CheriBSD.

pub const PROT_READ: i64 = 0x01;
pub const PROT_WRITE: i64 = 0x02;
pub const PROT_EXEC: i64 = 0x04;
pub const PROT_READ_CAP: i64 = 0x08;
pub const PROT_WRITE_CAP: i64 = 0x10;

pub const FLAG_COW: i64 = 0x01;
pub const FLAG_NEEDS_COPY: i64 = 0x02;
pub const FLAG_SUPER: i64 = 0x08;
pub const FLAG_GROWS_UP: i64 = 0x10;
pub const FLAG_GROWS_DOWN: i64 = 0x20;
pub const FLAG_USER_WIRED: i64 = 0x40;

/// `rwxRW`-style protection column, `-` for each missing bit.
pub fn protection_label(bits: i64) -> String {
    [
        (PROT_READ, 'r'),
        (PROT_WRITE, 'w'),
        (PROT_EXEC, 'x'),
        (PROT_READ_CAP, 'R'),
        (PROT_WRITE_CAP, 'W'),
    ]
    .iter()
    .map(|&(bit, c)| if bits & bit != 0 { c } else { '-' })
    .collect()
}

/// Five-column flag string: copy-on-write, needs-copy, superpages,
/// growth direction, user-wired.
pub fn flags_label(bits: i64) -> String {
    let set = |bit: i64, c: char| if bits & bit != 0 { c } else { '-' };
    let grows = if bits & FLAG_GROWS_UP != 0 {
        'U'
    } else if bits & FLAG_GROWS_DOWN != 0 {
        'D'
    } else {
        '-'
    };
    [
        set(FLAG_COW, 'C'),
        set(FLAG_NEEDS_COPY, 'N'),
        set(FLAG_SUPER, 'S'),
        grows,
        set(FLAG_USER_WIRED, 'W'),
    ]
    .iter()
    .collect()
}

/// Two-letter backing object type.
pub fn vnode_type_label(kind: i64) -> &'static str {
    match kind {
        0 => "--",
        1 => "df",
        2 => "vn",
        3 => "sw",
        4 => "dv",
        5 => "ph",
        6 => "dd",
        7 => "sg",
        8 => "md",
        9 => "gd",
        _ => "??",
    }
}
