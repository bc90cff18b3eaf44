use std::io;

use incubator::error::Error;

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }
}

#[test]
fn test_error_display() {
    let err = Error::ConfigError("invalid config".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid config.");

    let err = Error::LocalFilesNotFound { path: "/t/files".to_string() };
    assert_eq!(err.to_string(), "local template files directory not found: /t/files");

    let err = Error::TemplateDirNotFound { path: "/cache/x".to_string() };
    assert_eq!(err.to_string(), "template directory not found: /cache/x");

    let err = Error::git("git push", "rejected");
    assert_eq!(err.to_string(), "git push failed: rejected");
}

#[test]
fn test_write_error_keeps_path() {
    let err = Error::WriteError {
        path: "src/main.rs".to_string(),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    };
    assert!(err.to_string().contains("src/main.rs"));
}
