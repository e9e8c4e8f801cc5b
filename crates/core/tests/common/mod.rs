#![allow(dead_code)]

use std::path::Path;

use rusqlite::{params, Connection};

/// `vm` row: (path, start, end, compartment).
pub type VmRow<'a> = (&'a str, &'a str, &'a str, Option<i64>);

/// `cap_info` row: (location path, location addr, target addr, perms).
pub type CapRow<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Create a trace database laid out the way the capture tool writes it.
pub fn seed_trace(path: &Path, vm: &[VmRow<'_>], caps: &[CapRow<'_>]) {
    let conn = Connection::open(path).expect("open sqlite");
    conn.execute_batch(
        r#"
        CREATE TABLE vm (
            start_addr TEXT,
            end_addr   TEXT,
            mmap_path  TEXT,
            kve_protection INTEGER,
            mmap_flags INTEGER,
            vnode_type INTEGER,
            compart_id INTEGER
        );
        CREATE TABLE cap_info (
            cap_loc_addr TEXT,
            cap_loc_path TEXT,
            cap_addr     TEXT,
            perms        TEXT,
            base         TEXT,
            top          TEXT
        );
        "#,
    )
    .expect("create tables");
    for (p, start, end, compart) in vm {
        conn.execute(
            "INSERT INTO vm (start_addr, end_addr, mmap_path, kve_protection, mmap_flags, vnode_type, compart_id) VALUES (?1, ?2, ?3, 27, 1, 2, ?4)",
            params![start, end, p, compart],
        )
        .expect("insert vm row");
    }
    for (loc_path, loc_addr, target, perms) in caps {
        conn.execute(
            "INSERT INTO cap_info (cap_loc_addr, cap_loc_path, cap_addr, perms, base, top) VALUES (?1, ?2, ?3, ?4, ?3, ?3)",
            params![loc_addr, loc_path, target, perms],
        )
        .expect("insert cap row");
    }
}

/// `elf_sym` row: (symbol name, type, address).
pub type SymRow<'a> = (&'a str, &'a str, &'a str);

/// Add an `elf_sym` table to an existing trace.
pub fn seed_symbols(path: &Path, source: &str, syms: &[SymRow<'_>]) {
    let conn = Connection::open(path).expect("open sqlite");
    conn.execute_batch(
        r#"
        CREATE TABLE elf_sym (
            source_path TEXT,
            st_name     TEXT,
            st_value    TEXT,
            st_shndx    TEXT,
            type        TEXT,
            bind        TEXT,
            addr        TEXT
        );
        "#,
    )
    .expect("create elf_sym");
    for (name, kind, addr) in syms {
        conn.execute(
            "INSERT INTO elf_sym VALUES (?1, ?2, '0x0', ' 10', ?3, 'GLOBAL', ?4)",
            params![source, name, kind, addr],
        )
        .expect("insert symbol");
    }
}

/// The two-library trace used across tests.
pub fn two_library_trace(path: &Path) {
    seed_trace(
        path,
        &[
            ("Stack", "0x7000", "0x7fff", Some(-1)),
            ("libA", "0x1000", "0x1fff", Some(1)),
            ("libB", "0x2000", "0x2fff", Some(2)),
        ],
        &[
            ("libA", "0x1010", "0x2050", "rw"),
            ("libA", "0x1020", "0x2060", "rw"),
            ("libA", "0x1030", "0x1500", "rw"),
            ("Stack", "0x7010", "0x2010", "rwRW"),
            ("libB", "0x2100", "0x2200", "r"),
        ],
    );
}
