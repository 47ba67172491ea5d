use pmosoap::{ClientConfig, SoapVersion};
use std::fs;
use std::time::Duration;

#[test]
fn load_merges_file_with_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("soap.yaml");
    fs::write(
        &path,
        "timeout_secs: 7\nversion: \"1.2\"\nenable_decompression: false\n",
    )?;

    let config = ClientConfig::load(&path)?;

    assert_eq!(config.timeout(), Duration::from_secs(7));
    assert_eq!(config.version, Some(SoapVersion::Soap12));
    assert!(!config.enable_decompression);
    assert!(config.user_agent.starts_with("pmosoap/"));
    assert!(config.proxy.is_none());
    Ok(())
}

#[test]
fn missing_file_falls_back_to_embedded_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let config = ClientConfig::load(dir.path().join("absent.yaml"))?;

    assert_eq!(config.timeout_secs, 30);
    assert!(config.enable_decompression);
    assert_eq!(config.version, None);
    Ok(())
}

#[test]
fn malformed_file_is_an_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("soap.yaml");
    fs::write(&path, "timeout_secs: [1, 2\n")?;

    assert!(ClientConfig::load(&path).is_err());
    Ok(())
}
