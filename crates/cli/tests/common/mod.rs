#![allow(dead_code)]

use std::path::Path;

use rusqlite::{params, Connection};

/// Seed a trace with a stack, two libraries in separate compartments,
/// capabilities between them, and two of libA's symbols.
pub fn seed_trace(path: &Path) {
    let conn = Connection::open(path).expect("open sqlite");
    conn.execute_batch(
        r#"
        CREATE TABLE vm (start_addr TEXT, end_addr TEXT, mmap_path TEXT, compart_id INTEGER);
        CREATE TABLE cap_info (
            cap_loc_addr TEXT, cap_loc_path TEXT, cap_addr TEXT, perms TEXT, base TEXT, top TEXT
        );
        CREATE TABLE elf_sym (
            source_path TEXT, st_name TEXT, st_value TEXT, st_shndx TEXT,
            type TEXT, bind TEXT, addr TEXT
        );
        INSERT INTO elf_sym VALUES
            ('libA', 'got_entry', '0x10', ' 21', 'OBJECT', 'LOCAL', '0x1010'),
            ('libB', 'helper', '0x50', ' 12', 'FUNC', 'GLOBAL', '0x2050');
        "#,
    )
    .expect("create tables");

    let vm = [
        ("0x7000", "0x7fff", "Stack", -1_i64),
        ("0x1000", "0x1fff", "libA", 1),
        ("0x2000", "0x2fff", "libB", 2),
        ("0x40000", "0x40fff", "", 3),
    ];
    for (start, end, path, compart) in vm {
        conn.execute(
            "INSERT INTO vm (start_addr, end_addr, mmap_path, compart_id) VALUES (?1, ?2, ?3, ?4)",
            params![start, end, path, compart],
        )
        .expect("insert vm");
    }

    let caps = [
        ("0x1010", "libA", "0x2050", "rw"),
        ("0x1020", "libA", "0x2060", "rw"),
        ("0x7010", "Stack", "0x2010", "rwRW"),
    ];
    for (loc_addr, loc_path, target, perms) in caps {
        conn.execute(
            "INSERT INTO cap_info VALUES (?1, ?2, ?3, ?4, ?3, ?3)",
            params![loc_addr, loc_path, target, perms],
        )
        .expect("insert cap");
    }
}
