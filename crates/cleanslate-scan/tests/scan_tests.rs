use cleanslate_scan::{ScanConfig, ScanError, Walker, WarningKind};
use std::fs;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn scan(config: &ScanConfig) -> cleanslate_scan::WalkOutput {
    Walker::new()
        .scan(config, &CancellationToken::new())
        .unwrap()
}

#[test]
fn test_missing_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let result = Walker::new().scan(
        &ScanConfig::new(temp.path().join("nope")),
        &CancellationToken::new(),
    );
    assert!(matches!(result, Err(ScanError::NotFound { .. })));
}

#[test]
fn test_file_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("plain.txt");
    fs::write(&file, "x").unwrap();

    let result = Walker::new().scan(&ScanConfig::new(&file), &CancellationToken::new());
    assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
}

#[test]
fn test_empty_root() {
    let temp = TempDir::new().unwrap();
    let output = scan(&ScanConfig::new(temp.path()));
    assert!(output.records.is_empty());
    assert!(output.failures.is_empty());
}

#[test]
fn test_hidden_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".hidden"), "h").unwrap();
    fs::create_dir(temp.path().join(".cache")).unwrap();
    fs::write(temp.path().join(".cache/blob.bin"), "b").unwrap();
    fs::write(temp.path().join("visible.txt"), "v").unwrap();

    assert_eq!(scan(&ScanConfig::new(temp.path())).records.len(), 3);

    let config = ScanConfig::builder()
        .root(temp.path())
        .include_hidden(false)
        .build()
        .unwrap();
    let output = scan(&config);
    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].name(), "visible.txt");
}

#[test]
fn test_max_depth() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("a/b")).unwrap();
    fs::write(temp.path().join("top.txt"), "1").unwrap();
    fs::write(temp.path().join("a/mid.txt"), "2").unwrap();
    fs::write(temp.path().join("a/b/deep.txt"), "3").unwrap();

    let config = ScanConfig::builder()
        .root(temp.path())
        .max_depth(Some(2u32))
        .build()
        .unwrap();
    let names: Vec<String> = scan(&config).records.iter().map(|r| r.name()).collect();
    assert_eq!(names.len(), 2);
    assert!(!names.contains(&"deep.txt".to_string()));
}

#[test]
fn test_rescan_is_identical() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();
    for i in 0..20 {
        fs::write(temp.path().join(format!("sub/f{i}.dat")), vec![0u8; i]).unwrap();
    }

    let config = ScanConfig::new(temp.path());
    let mut first = scan(&config).records;
    let mut second = scan(&config).records;
    first.sort_by(|a, b| a.path.cmp(&b.path));
    second.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(first, second);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    use std::os::unix::fs::symlink;

    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir(root.join("real")).unwrap();
    fs::write(root.join("real/data.txt"), "payload").unwrap();
    symlink(root.join("real/data.txt"), root.join("link.txt")).unwrap();
    symlink(root.join("real"), root.join("linkdir")).unwrap();
    // A cycle back to the root.
    symlink(root, root.join("real/loop")).unwrap();

    let output = scan(&ScanConfig::new(root));
    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].name(), "data.txt");
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_reported_not_returned() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let locked = temp.path().join("locked.txt");
    fs::write(&locked, "secret").unwrap();
    fs::write(temp.path().join("open.txt"), "public").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::File::open(&locked).is_ok() {
        eprintln!("skipped: this user can read files without permission bits");
        return;
    }

    let output = scan(&ScanConfig::new(temp.path()));
    let locked = locked.canonicalize().unwrap_or(locked);

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].name(), "open.txt");
    assert_eq!(output.failures.count, 1);
    assert_eq!(
        output.failures.samples[0].kind,
        WarningKind::PermissionDenied
    );
    assert!(output.failures.contains(&locked));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let sealed = temp.path().join("sealed");
    fs::create_dir(&sealed).unwrap();
    fs::write(sealed.join("inner.txt"), "x").unwrap();
    fs::write(temp.path().join("outer.txt"), "y").unwrap();
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&sealed).is_ok() {
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
        eprintln!("skipped: directory permission bits are not enforced");
        return;
    }

    let output = scan(&ScanConfig::new(temp.path()));
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].name(), "outer.txt");
    assert!(output.failures.count >= 1);
}

#[test]
fn test_progress_is_published() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();

    let walker = Walker::new();
    let mut rx = walker.subscribe();
    walker
        .scan(&ScanConfig::new(temp.path()), &CancellationToken::new())
        .unwrap();

    let progress = rx.try_recv().unwrap();
    assert_eq!(progress.files_scanned, 1);
}
