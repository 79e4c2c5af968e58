// SPDX-License-Identifier: AGPL-3.0

#[cfg(test)]
mod tests {
    use clap::Parser;
    use solmap_config::{Config, CONFIG_FILE_NAME};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_under_root() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[global]\ncompiler-output = \"build/out.json\"\ncontract = \"BeerBar\"\nexplain = true\n",
        )
        .unwrap();

        let root = dir.path().to_str().unwrap();
        let cli = Config::try_parse_from(["solmap", "0x90e", "--root", root]).unwrap();
        let config = cli.with_config_file().unwrap();

        assert_eq!(config.contract, "BeerBar");
        assert!(config.explain);
        assert_eq!(config.addresses, vec!["0x90e"]);
        assert_eq!(
            config.resolved_compiler_output(),
            Some(dir.path().join("build/out.json"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[global]\ncontract = \"FromFile\"\nno-color = true\n").unwrap();

        let cli = Config::try_parse_from([
            "solmap",
            "1798",
            "--config",
            path.to_str().unwrap(),
            "--contract",
            "FromCli",
        ])
        .unwrap();
        let config = cli.with_config_file().unwrap();

        assert_eq!(config.contract, "FromCli");
        assert!(config.no_color);
        assert_eq!(config.config, Some(path));
    }

    #[test]
    fn test_without_config_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Config::try_parse_from(["solmap", "0", "--root", root, "-o", "out.json"]).unwrap();
        let config = cli.with_config_file().unwrap();

        assert_eq!(config.compiler_output, Some(PathBuf::from("out.json")));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let cli = Config::try_parse_from(["solmap", "0", "--config", missing.to_str().unwrap()])
            .unwrap();
        let err = cli.with_config_file().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
