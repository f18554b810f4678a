use std::path::Path;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// No colons: they are illegal in file names on Windows and awkward on macOS.
const TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]-[minute]-[second].[subsecond digits:6]Z");

/// Derive the backup file name for `source` stamped at `at`.
///
/// `attempt` disambiguates names that are already taken; attempt `0` has no
/// suffix, later attempts append `-<attempt>` to the timestamp. Returns
/// `None` if `source` has no file name (e.g. `/` or `..`).
///
/// # Examples
///
/// ```
/// use safehold_backup::backup_name;
/// use std::path::Path;
/// use time::macros::datetime;
///
/// let at = datetime!(2025-04-23 09:41:07.25 UTC);
/// assert_eq!(
///     backup_name(Path::new("/docs/notes.txt"), at, 0).unwrap(),
///     "notes_Backup_2025-04-23T09-41-07.250000Z.txt"
/// );
/// assert_eq!(
///     backup_name(Path::new("/docs/notes.txt"), at, 2).unwrap(),
///     "notes_Backup_2025-04-23T09-41-07.250000Z-2.txt"
/// );
/// ```
pub fn backup_name(source: &Path, at: OffsetDateTime, attempt: u32) -> Option<String> {
    let stem = source.file_stem()?.to_string_lossy();
    let at = at.to_offset(time::UtcOffset::UTC);
    // Infallible: every component of the description exists on an OffsetDateTime.
    let stamp = at.format(TIMESTAMP).ok()?;
    let suffix = match attempt {
        0 => String::new(),
        n => format!("-{n}"),
    };
    Some(match source.extension() {
        Some(ext) => format!("{stem}_Backup_{stamp}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_Backup_{stamp}{suffix}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    #[rstest]
    #[case("/a/notes.txt", 0, "notes_Backup_2025-04-23T09-41-07.000000Z.txt")]
    #[case("/a/report.final.pdf", 0, "report.final_Backup_2025-04-23T09-41-07.000000Z.pdf")]
    #[case("/a/Makefile", 0, "Makefile_Backup_2025-04-23T09-41-07.000000Z")]
    #[case("/a/invoices", 3, "invoices_Backup_2025-04-23T09-41-07.000000Z-3")]
    #[case("/a/.profile", 0, ".profile_Backup_2025-04-23T09-41-07.000000Z")]
    fn test_names(#[case] source: &str, #[case] attempt: u32, #[case] expected: &str) {
        let at = datetime!(2025-04-23 09:41:07 UTC);
        assert_eq!(backup_name(Path::new(source), at, attempt).unwrap(), expected);
    }

    #[test]
    fn test_no_file_name() {
        let at = datetime!(2025-04-23 09:41:07 UTC);
        assert!(backup_name(Path::new("/"), at, 0).is_none());
        assert!(backup_name(Path::new("a/.."), at, 0).is_none());
    }

    #[test]
    fn test_offsets_are_normalized_to_utc() {
        let local = datetime!(2025-04-23 11:41:07 +02:00);
        let name = backup_name(Path::new("notes.txt"), local, 0).unwrap();
        assert_eq!(name, "notes_Backup_2025-04-23T09-41-07.000000Z.txt");
    }

    #[test]
    fn test_names_sort_chronologically() {
        let earlier = backup_name(Path::new("notes.txt"), datetime!(2025-04-23 09:59:59.999 UTC), 0).unwrap();
        let later = backup_name(Path::new("notes.txt"), datetime!(2025-04-23 10:00:00 UTC), 0).unwrap();
        let much_later = backup_name(Path::new("notes.txt"), datetime!(2026-01-01 00:00:00 UTC), 0).unwrap();
        let mut names = vec![much_later.clone(), earlier.clone(), later.clone()];
        names.sort();
        assert_eq!(names, vec![earlier, later, much_later]);
    }

    #[test]
    fn test_names_are_path_safe() {
        let name = backup_name(Path::new("notes.txt"), OffsetDateTime::now_utc(), 0).unwrap();
        assert!(!name.contains([':', '/', '\\', '*', '?', '"', '<', '>', '|']));
    }
}
