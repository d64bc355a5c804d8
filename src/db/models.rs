// src/db/models.rs

//! Row mapping for the packages table
//!
//! List fields are stored `", "`-joined, the maintainer as two nullable
//! columns. An insert with an already-present identity tuple replaces the
//! prior row.

use crate::debian::{split_list, PackageInfo, PackageMaintainer};
use crate::error::Result;
use rusqlite::{params, Connection, Row};

const PACKAGE_COLUMNS: &str = "name, version, component, suite, pocket, architecture, \
     source, section, maintainer_name, maintainer_email, sha256, size, installed_size, \
     file_name, depends, pre_depends, replaces, conflicts, suggests, description, archive_url";

/// Insert a package record, replacing any prior record with the same
/// (name, component, suite, pocket, architecture, archive_url) identity.
pub fn insert_package(conn: &Connection, pkg: &PackageInfo) -> Result<()> {
    let (maintainer_name, maintainer_email) = match &pkg.maintainer {
        Some(maintainer) => (maintainer.name.as_str(), maintainer.email.as_str()),
        None => ("", ""),
    };

    conn.execute(
        "INSERT OR REPLACE INTO packages VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            &pkg.name,
            &pkg.version,
            &pkg.component,
            &pkg.suite,
            &pkg.pocket,
            &pkg.architecture,
            &pkg.source,
            &pkg.section,
            maintainer_name,
            maintainer_email,
            &pkg.sha256,
            pkg.size,
            pkg.installed_size,
            &pkg.file_name,
            pkg.depends.join(", "),
            pkg.pre_depends.join(", "),
            pkg.replaces.join(", "),
            pkg.conflicts.join(", "),
            pkg.suggests.join(", "),
            &pkg.description,
            &pkg.archive_url,
        ],
    )?;

    Ok(())
}

/// Every stored record for a package name, in unspecified order.
pub fn find_by_name(conn: &Connection, name: &str) -> Result<Vec<PackageInfo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PACKAGE_COLUMNS} FROM packages WHERE name = ?1"
    ))?;

    let packages = stmt
        .query_map([name], package_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(packages)
}

/// Total number of stored records.
pub fn count_packages(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))?;
    Ok(count)
}

fn package_from_row(row: &Row) -> rusqlite::Result<PackageInfo> {
    let maintainer_name: String = row.get(8)?;
    let maintainer_email: String = row.get(9)?;
    let maintainer = if maintainer_name.is_empty() && maintainer_email.is_empty() {
        None
    } else {
        Some(PackageMaintainer {
            name: maintainer_name,
            email: maintainer_email,
        })
    };

    Ok(PackageInfo {
        name: row.get(0)?,
        version: row.get(1)?,
        component: row.get(2)?,
        suite: row.get(3)?,
        pocket: row.get(4)?,
        architecture: row.get(5)?,
        source: row.get(6)?,
        section: row.get(7)?,
        maintainer,
        sha256: row.get(10)?,
        size: row.get(11)?,
        installed_size: row.get(12)?,
        file_name: row.get(13)?,
        depends: list_column(row.get(14)?),
        pre_depends: list_column(row.get(15)?),
        replaces: list_column(row.get(16)?),
        conflicts: list_column(row.get(17)?),
        suggests: list_column(row.get(18)?),
        description: row.get(19)?,
        archive_url: row.get(20)?,
    })
}

fn list_column(value: String) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        split_list(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::debian::IndexLocation;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::migrate(&conn).unwrap();
        conn
    }

    fn sample(name: &str, arch: &str) -> PackageInfo {
        let location = IndexLocation {
            suite: "jammy".to_string(),
            pocket: String::new(),
            component: "main".to_string(),
            architecture: arch.to_string(),
        };
        let mut pkg = PackageInfo::new(name, &location, "http://a/ubuntu/dists");
        pkg.version = "1.0".to_string();
        pkg.sha256 = "00".repeat(32);
        pkg.size = 42;
        pkg.file_name = format!("pool/main/{name}.deb");
        pkg.depends = vec!["libc6 (>= 2.34)".to_string(), "zlib1g".to_string()];
        pkg.maintainer = Some(PackageMaintainer {
            name: "A".to_string(),
            email: "a@x".to_string(),
        });
        pkg
    }

    #[test]
    fn test_insert_and_find_round_trip() {
        let conn = test_conn();
        let pkg = sample("foo", "amd64");
        insert_package(&conn, &pkg).unwrap();

        let found = find_by_name(&conn, "foo").unwrap();
        assert_eq!(found, vec![pkg]);
    }

    #[test]
    fn test_same_identity_replaces() {
        let conn = test_conn();
        let mut pkg = sample("foo", "amd64");
        insert_package(&conn, &pkg).unwrap();

        pkg.version = "2.0".to_string();
        insert_package(&conn, &pkg).unwrap();

        let found = find_by_name(&conn, "foo").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].version, "2.0");
    }

    #[test]
    fn test_distinct_architectures_coexist() {
        let conn = test_conn();
        insert_package(&conn, &sample("foo", "amd64")).unwrap();
        insert_package(&conn, &sample("foo", "arm64")).unwrap();
        insert_package(&conn, &sample("bar", "amd64")).unwrap();

        assert_eq!(find_by_name(&conn, "foo").unwrap().len(), 2);
        assert_eq!(count_packages(&conn).unwrap(), 3);
    }

    #[test]
    fn test_unknown_name_is_empty() {
        let conn = test_conn();
        assert!(find_by_name(&conn, "does-not-exist").unwrap().is_empty());
    }

    #[test]
    fn test_missing_maintainer_round_trips_as_none() {
        let conn = test_conn();
        let mut pkg = sample("foo", "amd64");
        pkg.maintainer = None;
        pkg.depends = Vec::new();
        insert_package(&conn, &pkg).unwrap();

        let found = find_by_name(&conn, "foo").unwrap();
        assert!(found[0].maintainer.is_none());
        assert!(found[0].depends.is_empty());
    }
}
