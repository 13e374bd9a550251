use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ParseError::unsupported("x")
            .to_string()
            .contains("unsupported format:")
    );
    assert!(
        ParseError::malformed("x")
            .to_string()
            .contains("malformed container:")
    );
    assert!(
        RasterError::corrupt("x")
            .to_string()
            .contains("corrupt layer data:")
    );
    assert!(
        RasterError::UnsupportedCompression(9)
            .to_string()
            .contains("unsupported channel compression: 9")
    );
}

#[test]
fn document_error_is_transparent_over_parse_errors() {
    let err = DocumentError::from(ParseError::malformed("truncated header"));
    assert_eq!(err.to_string(), "malformed container: truncated header");
}

#[test]
fn write_error_names_the_path() {
    let err = WriteError::CreateDir {
        path: PathBuf::from("out/doc"),
        source: std::io::Error::other("denied"),
    };
    let msg = err.to_string();
    assert!(msg.contains("out/doc"));
    assert!(msg.contains("denied"));
}

#[test]
fn only_storage_failures_are_fatal() {
    let dup = StoreError::DuplicateDocument {
        stem: "a".to_string(),
        source_path: "a.psd".to_string(),
    };
    assert!(!dup.is_fatal());

    let sql = StoreError::Sqlite(rusqlite::Error::InvalidQuery);
    assert!(sql.is_fatal());
}
